//! Core types shared across the SEPA engine

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SEPA message type
///
/// Fixed at message creation. Determines the extension field schema and the
/// document structure produced by the serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// pain.008 customer direct debit initiation
    DirectDebitInitiation,
    /// pain.001 customer credit transfer initiation
    CreditTransferInitiation,
}

impl MessageType {
    /// Numeric code used at the binding boundary
    pub fn code(self) -> i64 {
        match self {
            MessageType::DirectDebitInitiation => 1,
            MessageType::CreditTransferInitiation => 2,
        }
    }

    /// ISO 20022 message definition identifier
    pub fn iso_name(self) -> &'static str {
        match self {
            MessageType::DirectDebitInitiation => "pain.008.001.02",
            MessageType::CreditTransferInitiation => "pain.001.001.03",
        }
    }

    /// XML namespace of the document
    pub fn namespace(self) -> &'static str {
        match self {
            MessageType::DirectDebitInitiation => "urn:iso:std:iso:20022:tech:xsd:pain.008.001.02",
            MessageType::CreditTransferInitiation => {
                "urn:iso:std:iso:20022:tech:xsd:pain.001.001.03"
            }
        }
    }

    /// Message element directly below `Document`
    pub fn document_element(self) -> &'static str {
        match self {
            MessageType::DirectDebitInitiation => "CstmrDrctDbtInitn",
            MessageType::CreditTransferInitiation => "CstmrCdtTrfInitn",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.iso_name())
    }
}

impl TryFrom<i64> for MessageType {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        match code {
            1 => Ok(MessageType::DirectDebitInitiation),
            2 => Ok(MessageType::CreditTransferInitiation),
            other => Err(Error::InvalidArgument(format!(
                "unsupported message type code {}",
                other
            ))),
        }
    }
}

impl FromStr for MessageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ddi" | "direct_debit" | "pain.008" | "pain.008.001.02" => {
                Ok(MessageType::DirectDebitInitiation)
            }
            "cti" | "credit_transfer" | "pain.001" | "pain.001.001.03" => {
                Ok(MessageType::CreditTransferInitiation)
            }
            _ => Err(Error::InvalidArgument(format!(
                "unsupported message type '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<&str> for MessageType {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

/// Bank reference record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankRecord {
    /// Bank Identifier Code (8 or 11 characters)
    pub bic: String,

    /// Registered bank name
    pub name: String,

    /// National routing code (BLZ, sort code, ...)
    #[serde(default)]
    pub bank_code: Option<String>,

    /// City of the head office or branch
    #[serde(default)]
    pub city: Option<String>,

    /// ISO 3166 country code
    pub country: String,
}

/// BIC lookup policy of the bank registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPolicy {
    /// Only the BIC exactly as given
    #[default]
    Exact,
    /// 11-character BICs fall back to the institution's primary office
    PrefixFallback,
}

impl FromStr for LookupPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(LookupPolicy::Exact),
            "prefix_fallback" | "prefix-fallback" => Ok(LookupPolicy::PrefixFallback),
            _ => Err(Error::Config(format!("unknown BIC lookup policy '{}'", s))),
        }
    }
}

/// Composition path taken by the IBAN converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    /// Bank and account identifiers used exactly as given
    Direct,
    /// Numeric identifiers were left-padded with zeros
    Padded,
    /// National check digits were computed and inserted
    NationalCheck,
}

impl ConversionStatus {
    /// Numeric status code reported at the binding boundary
    pub fn code(self) -> i64 {
        match self {
            ConversionStatus::Direct => 0,
            ConversionStatus::Padded => 1,
            ConversionStatus::NationalCheck => 2,
        }
    }
}

impl fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConversionStatus::Direct => "direct",
            ConversionStatus::Padded => "padded",
            ConversionStatus::NationalCheck => "national-check",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_codes() {
        assert_eq!(
            MessageType::try_from(1i64).unwrap(),
            MessageType::DirectDebitInitiation
        );
        assert_eq!(
            MessageType::try_from(2i64).unwrap(),
            MessageType::CreditTransferInitiation
        );
        assert!(matches!(
            MessageType::try_from(3i64),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_message_type_parse() {
        assert_eq!(
            "DDI".parse::<MessageType>().unwrap(),
            MessageType::DirectDebitInitiation
        );
        assert_eq!(
            "pain.001".parse::<MessageType>().unwrap(),
            MessageType::CreditTransferInitiation
        );
        assert!("pacs.008".parse::<MessageType>().is_err());
    }

    #[test]
    fn test_lookup_policy_parse() {
        assert_eq!("exact".parse::<LookupPolicy>().unwrap(), LookupPolicy::Exact);
        assert_eq!(
            "prefix_fallback".parse::<LookupPolicy>().unwrap(),
            LookupPolicy::PrefixFallback
        );
        assert!("fuzzy".parse::<LookupPolicy>().is_err());
    }
}
