//! Error types for SEPA message construction and lookups

use std::fmt;
use thiserror::Error;

/// Result type for SEPA operations
pub type Result<T> = std::result::Result<T, Error>;

/// One rejected extension field in an `add` batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Field key as supplied by the caller
    pub field: String,
    /// Human-readable reason
    pub reason: String,
}

impl FieldViolation {
    /// Create new violation
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// SEPA errors
#[derive(Error, Debug)]
pub enum Error {
    /// Wrong shape of a call's inputs (e.g. unsupported message type)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A header field failed its format, length or checksum rule
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// Field name
        field: String,
        /// Reason for rejection
        reason: String,
    },

    /// Extension keys outside the schema of the message type
    #[error("Unknown field(s) for {message_type}: {}", .keys.join(", "))]
    UnknownField {
        /// Message type the batch was validated against
        message_type: String,
        /// Every unrecognized key, in batch order
        keys: Vec<String>,
    },

    /// Extension values that failed their schema rule
    #[error("Invalid field(s): {}", join_violations(.0))]
    InvalidFields(Vec<FieldViolation>),

    /// Serialization attempted before all required fields were set
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// No registry entry or no IBAN layout rule
    #[error("Not found: {0}")]
    NotFound(String),

    /// Process-wide engine used before `initialize`
    #[error("SEPA engine not initialized")]
    NotInitialized,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Bank reference data could not be loaded
    #[error("Registry error: {0}")]
    Registry(String),

    /// XML writer failure
    #[error("XML error: {0}")]
    Xml(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Build an `InvalidField` error
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller can fix this error by supplying corrected input
    pub fn is_caller_correctable(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_)
                | Error::InvalidField { .. }
                | Error::UnknownField { .. }
                | Error::InvalidFields(_)
                | Error::MissingField(_)
                | Error::NotFound(_)
        )
    }

    /// Keys named by the error, if it concerns specific fields
    pub fn offending_keys(&self) -> Vec<&str> {
        match self {
            Error::InvalidField { field, .. } => vec![field.as_str()],
            Error::UnknownField { keys, .. } => keys.iter().map(String::as_str).collect(),
            Error::InvalidFields(violations) => {
                violations.iter().map(|v| v.field.as_str()).collect()
            }
            Error::MissingField(field) => vec![field.as_str()],
            _ => Vec::new(),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::Xml(e.to_string())
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_lists_every_key() {
        let err = Error::UnknownField {
            message_type: "pain.008.001.02".to_string(),
            keys: vec!["foo".to_string(), "bar".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown field(s) for pain.008.001.02: foo, bar"
        );
        assert_eq!(err.offending_keys(), vec!["foo", "bar"]);
    }

    #[test]
    fn test_invalid_fields_display() {
        let err = Error::InvalidFields(vec![
            FieldViolation::new("amount", "must be greater than zero"),
            FieldViolation::new("mandate_date", "not a calendar date"),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid field(s): amount: must be greater than zero; mandate_date: not a calendar date"
        );
    }

    #[test]
    fn test_caller_correctable() {
        assert!(Error::MissingField("iban".into()).is_caller_correctable());
        assert!(!Error::NotInitialized.is_caller_correctable());
        assert!(!Error::Xml("boom".into()).is_caller_correctable());
    }
}
