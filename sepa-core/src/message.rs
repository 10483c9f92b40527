//! In-progress SEPA message
//!
//! A `Message` is owned by its creator and only changes through the engine's
//! setters, which validate first and write second. Extension fields live in a
//! single insertion-ordered vector; its length is driven by actual inserts.

use crate::MessageType;
use serde::Serialize;

/// One DDI or CTI message under construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    message_type: MessageType,
    name: Option<String>,
    iban: Option<String>,
    bic: Option<String>,
    fields: Vec<(String, String)>,
    last_error: Option<String>,
}

impl Message {
    /// Create an empty message of the given type
    pub fn new(message_type: MessageType) -> Self {
        Self {
            message_type,
            name: None,
            iban: None,
            bic: None,
            fields: Vec::new(),
            last_error: None,
        }
    }

    /// Message type, fixed at creation
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Account holder name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Account IBAN
    pub fn iban(&self) -> Option<&str> {
        self.iban.as_deref()
    }

    /// Agent BIC
    pub fn bic(&self) -> Option<&str> {
        self.bic.as_deref()
    }

    /// Extension fields in stored order
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Value of an extension field
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Description of the most recent failed operation
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub(crate) fn set_iban(&mut self, iban: &str) {
        self.iban = Some(iban.to_string());
    }

    pub(crate) fn set_bic(&mut self, bic: &str) {
        self.bic = Some(bic.to_string());
    }

    /// Merge a validated batch: existing keys are overwritten in place, new
    /// keys are appended in first-seen order
    pub(crate) fn merge_fields<K, V>(&mut self, entries: &[(K, V)])
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in entries {
            let (key, value) = (key.as_ref(), value.as_ref());
            match self.fields.iter_mut().find(|(k, _)| k == key) {
                Some((_, existing)) => *existing = value.to_string(),
                None => self.fields.push((key.to_string(), value.to_string())),
            }
        }
    }

    pub(crate) fn record_error(&mut self, error: &crate::Error) {
        self.last_error = Some(error.to_string());
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }
}
