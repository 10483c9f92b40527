//! Field validation
//!
//! - Header fields: name, IBAN, BIC
//! - Extension batches against the schema of a message type
//!
//! A batch is validated as a whole; the caller only merges it when every key
//! is known and every value passes its rule.

use crate::error::FieldViolation;
use crate::schema::{self, FieldKind, MAX_FIELD_VALUE_LEN};
use crate::{iban, Error, MessageType, Result};
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Maximum length of the account holder name
pub const NAME_MAX_LENGTH: usize = 70;

/// Structural BIC check: 4 letters bank, 2 letters country, 2 alphanumeric
/// location, optional 3 alphanumeric branch
pub fn is_valid_bic(bic: &str) -> bool {
    let bytes = bic.as_bytes();
    (bytes.len() == 8 || bytes.len() == 11)
        && bytes[..6].iter().all(u8::is_ascii_uppercase)
        && bytes[6..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Validator for header and extension fields
#[derive(Debug, Clone)]
pub struct FieldValidator {
    /// SEPA basic Latin character set
    text_regex: Regex,
    /// SEPA restricted identifier character set
    identifier_regex: Regex,
    /// BIC layout
    bic_regex: Regex,
    /// Plain euro amount up to 999999999.99
    amount_regex: Regex,
    /// ISO date `YYYY-MM-DD` without sign or extra digits
    date_regex: Regex,
}

impl FieldValidator {
    /// Create new validator
    pub fn new() -> Result<Self> {
        Ok(Self {
            text_regex: compile(r"^[A-Za-z0-9/\-?:().,'+ ]+$")?,
            identifier_regex: compile(r"^[A-Za-z0-9/\-?:().,'+]+$")?,
            bic_regex: compile(r"^[A-Z]{4}[A-Z]{2}[A-Z0-9]{2}([A-Z0-9]{3})?$")?,
            amount_regex: compile(r"^[0-9]{1,9}(\.[0-9]{1,2})?$")?,
            date_regex: compile(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$")?,
        })
    }

    // =========================================================================
    // HEADER FIELDS
    // =========================================================================

    /// Validate the account holder name
    pub fn validate_name(&self, name: &str) -> Result<()> {
        self.check_text(name, NAME_MAX_LENGTH)
            .map_err(|reason| Error::invalid_field("name", reason))
    }

    /// Validate an IBAN: length bound, country format and MOD 97-10 checksum
    pub fn validate_iban(&self, value: &str) -> Result<()> {
        if iban::is_valid(value) {
            Ok(())
        } else {
            Err(Error::invalid_field("iban", iban::rejection_reason(value)))
        }
    }

    /// Validate a BIC (8 or 11 characters)
    pub fn validate_bic(&self, bic: &str) -> Result<()> {
        self.check_bic(bic)
            .map_err(|reason| Error::invalid_field("bic", reason))
    }

    // =========================================================================
    // EXTENSION FIELDS
    // =========================================================================

    /// Validate a whole extension batch against the schema of `message_type`
    ///
    /// Unknown keys are reported first, all of them. Only when every key is
    /// known are the values checked, again reporting every violation.
    pub fn validate_fields<K, V>(&self, message_type: MessageType, entries: &[(K, V)]) -> Result<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut unknown: Vec<String> = Vec::new();
        for (key, _) in entries {
            let key = key.as_ref();
            if schema::lookup(message_type, key).is_none() && !unknown.iter().any(|k| k == key) {
                unknown.push(key.to_string());
            }
        }
        if !unknown.is_empty() {
            return Err(Error::UnknownField {
                message_type: message_type.to_string(),
                keys: unknown,
            });
        }

        let violations: Vec<FieldViolation> = entries
            .iter()
            .filter_map(|(key, value)| {
                let key = key.as_ref();
                let spec = schema::lookup(message_type, key)?;
                self.check_value(spec.kind, value.as_ref())
                    .err()
                    .map(|reason| FieldViolation::new(key, reason))
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidFields(violations))
        }
    }

    fn check_value(&self, kind: FieldKind, value: &str) -> std::result::Result<(), String> {
        let len = value.chars().count();
        if len > MAX_FIELD_VALUE_LEN {
            return Err(format!(
                "length {} exceeds maximum of {}",
                len, MAX_FIELD_VALUE_LEN
            ));
        }

        match kind {
            FieldKind::Text(max) => self.check_text(value, max),
            FieldKind::Identifier(max) => self.check_identifier(value, max),
            FieldKind::Date => self.check_date(value),
            FieldKind::Amount => self.check_amount(value),
            FieldKind::Code(allowed) => {
                if allowed.contains(&value) {
                    Ok(())
                } else {
                    Err(format!("must be one of {}", allowed.join(", ")))
                }
            }
            FieldKind::Iban => {
                if iban::is_valid(value) {
                    Ok(())
                } else {
                    Err(iban::rejection_reason(value))
                }
            }
            FieldKind::Bic => self.check_bic(value),
        }
    }

    fn check_text(&self, value: &str, max: usize) -> std::result::Result<(), String> {
        check_length(value, max)?;
        if !self.text_regex.is_match(value) {
            return Err("contains characters outside the SEPA character set".to_string());
        }
        if value.trim().is_empty() {
            return Err("must not be blank".to_string());
        }
        Ok(())
    }

    fn check_identifier(&self, value: &str, max: usize) -> std::result::Result<(), String> {
        check_length(value, max)?;
        if !self.identifier_regex.is_match(value) {
            return Err("contains characters not allowed in SEPA identifiers".to_string());
        }
        if value.starts_with('/') || value.ends_with('/') || value.contains("//") {
            return Err("must not start or end with '/' or contain '//'".to_string());
        }
        Ok(())
    }

    fn check_bic(&self, bic: &str) -> std::result::Result<(), String> {
        let len = bic.chars().count();
        if len != 8 && len != 11 {
            return Err(format!("must be 8 or 11 characters, got {}", len));
        }
        if !self.bic_regex.is_match(bic) {
            return Err(
                "expected 4-letter bank code, 2-letter country, 2-character location and optional 3-character branch"
                    .to_string(),
            );
        }
        Ok(())
    }

    fn check_date(&self, value: &str) -> std::result::Result<(), String> {
        if !self.date_regex.is_match(value) {
            return Err(format!("expected YYYY-MM-DD, got '{}'", value));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|_| ())
            .map_err(|e| format!("not a calendar date: {}", e))
    }

    fn check_amount(&self, value: &str) -> std::result::Result<(), String> {
        if !self.amount_regex.is_match(value) {
            return Err(format!(
                "expected digits with up to two decimals (e.g. 1250.50), got '{}'",
                value
            ));
        }
        let amount =
            Decimal::from_str(value).map_err(|e| format!("not a decimal amount: {}", e))?;
        if amount <= Decimal::ZERO {
            return Err("must be greater than zero".to_string());
        }
        Ok(())
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config(format!("invalid pattern {}: {}", pattern, e)))
}

fn check_length(value: &str, max: usize) -> std::result::Result<(), String> {
    let len = value.chars().count();
    if len == 0 {
        return Err("must not be empty".to_string());
    }
    if len > max {
        return Err(format!("length {} exceeds maximum of {}", len, max));
    }
    Ok(())
}
