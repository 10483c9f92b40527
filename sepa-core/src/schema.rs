//! Extension field schemas
//!
//! Each message type accepts a fixed set of extension keys. Every key maps to
//! a value kind (validated by `FieldValidator`) and to the XML element path it
//! is written under. Declaration order is significant: it is the order in
//! which missing required fields are reported.

use crate::MessageType;

/// Overall cap on any extension value, in characters
pub const MAX_FIELD_VALUE_LEN: usize = 500;

/// Codes allowed for the direct debit sequence type
pub const SEQUENCE_TYPES: &[&str] = &["FRST", "RCUR", "OOFF", "FNAL"];

/// Currency of instructed amounts
pub const SEPA_CURRENCY: &str = "EUR";

/// Value rule of an extension field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// SEPA Latin text, up to the given number of characters
    Text(usize),
    /// SEPA restricted identifier, up to the given number of characters
    Identifier(usize),
    /// ISO date `YYYY-MM-DD`
    Date,
    /// Positive euro amount with at most two fraction digits
    Amount,
    /// One of a fixed set of codes
    Code(&'static [&'static str]),
    /// Checksum-valid IBAN
    Iban,
    /// Structurally valid BIC
    Bic,
}

/// One extension field of a message type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key accepted by `add`
    pub key: &'static str,
    /// Element path below the payment information block
    pub path: &'static [&'static str],
    /// Value rule
    pub kind: FieldKind,
    /// Must be present before serialization
    pub required: bool,
}

const fn field(key: &'static str, path: &'static [&'static str], kind: FieldKind) -> FieldSpec {
    FieldSpec {
        key,
        path,
        kind,
        required: false,
    }
}

const fn required(key: &'static str, path: &'static [&'static str], kind: FieldKind) -> FieldSpec {
    FieldSpec {
        key,
        path,
        kind,
        required: true,
    }
}

static DIRECT_DEBIT_FIELDS: &[FieldSpec] = &[
    required("mandate_id", &["DrctDbtTx", "MndtRltdInf", "MndtId"], FieldKind::Identifier(35)),
    field("mandate_date", &["DrctDbtTx", "MndtRltdInf", "DtOfSgntr"], FieldKind::Date),
    field("creditor_id", &["CdtrSchmeId", "Id", "PrvtId", "Othr", "Id"], FieldKind::Identifier(35)),
    field("end_to_end_id", &["PmtId", "EndToEndId"], FieldKind::Identifier(35)),
    field("amount", &["InstdAmt"], FieldKind::Amount),
    field("sequence_type", &["PmtTpInf", "SeqTp"], FieldKind::Code(SEQUENCE_TYPES)),
    field("collection_date", &["ReqdColltnDt"], FieldKind::Date),
    field("debtor_name", &["Dbtr", "Nm"], FieldKind::Text(70)),
    field("debtor_iban", &["DbtrAcct", "Id", "IBAN"], FieldKind::Iban),
    field("debtor_bic", &["DbtrAgt", "FinInstnId", "BIC"], FieldKind::Bic),
    field("remittance_info", &["RmtInf", "Ustrd"], FieldKind::Text(140)),
];

static CREDIT_TRANSFER_FIELDS: &[FieldSpec] = &[
    required("end_to_end_id", &["PmtId", "EndToEndId"], FieldKind::Identifier(35)),
    field("instruction_id", &["PmtId", "InstrId"], FieldKind::Identifier(35)),
    field("amount", &["Amt", "InstdAmt"], FieldKind::Amount),
    field("execution_date", &["ReqdExctnDt"], FieldKind::Date),
    field("creditor_name", &["Cdtr", "Nm"], FieldKind::Text(70)),
    field("creditor_iban", &["CdtrAcct", "Id", "IBAN"], FieldKind::Iban),
    field("creditor_bic", &["CdtrAgt", "FinInstnId", "BIC"], FieldKind::Bic),
    field("purpose_code", &["Purp", "Cd"], FieldKind::Identifier(4)),
    field("remittance_info", &["RmtInf", "Ustrd"], FieldKind::Text(140)),
];

/// Element names of the message owner's party, account and agent blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderElements {
    /// Party block holding `Nm`
    pub party: &'static str,
    /// Account block holding `Id/IBAN`
    pub account: &'static str,
    /// Agent block holding `FinInstnId/BIC`
    pub agent: &'static str,
}

/// Field schema of a message type, in declaration order
pub fn fields(message_type: MessageType) -> &'static [FieldSpec] {
    match message_type {
        MessageType::DirectDebitInitiation => DIRECT_DEBIT_FIELDS,
        MessageType::CreditTransferInitiation => CREDIT_TRANSFER_FIELDS,
    }
}

/// Schema entry for a key, if the message type accepts it
pub fn lookup(message_type: MessageType, key: &str) -> Option<&'static FieldSpec> {
    fields(message_type).iter().find(|spec| spec.key == key)
}

/// Required keys in declaration order
pub fn required_keys(message_type: MessageType) -> impl Iterator<Item = &'static str> {
    fields(message_type)
        .iter()
        .filter(|spec| spec.required)
        .map(|spec| spec.key)
}

/// Header blocks: the creditor collects a direct debit, the debtor sends a transfer
pub fn header_elements(message_type: MessageType) -> HeaderElements {
    match message_type {
        MessageType::DirectDebitInitiation => HeaderElements {
            party: "Cdtr",
            account: "CdtrAcct",
            agent: "CdtrAgt",
        },
        MessageType::CreditTransferInitiation => HeaderElements {
            party: "Dbtr",
            account: "DbtrAcct",
            agent: "DbtrAgt",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_keys() {
        assert_eq!(
            required_keys(MessageType::DirectDebitInitiation).collect::<Vec<_>>(),
            vec!["mandate_id"]
        );
        assert_eq!(
            required_keys(MessageType::CreditTransferInitiation).collect::<Vec<_>>(),
            vec!["end_to_end_id"]
        );
    }

    #[test]
    fn test_lookup_is_per_message_type() {
        assert!(lookup(MessageType::DirectDebitInitiation, "mandate_id").is_some());
        assert!(lookup(MessageType::CreditTransferInitiation, "mandate_id").is_none());
        assert!(lookup(MessageType::CreditTransferInitiation, "creditor_iban").is_some());
    }

    #[test]
    fn test_keys_unique_and_paths_nonempty() {
        for message_type in [
            MessageType::DirectDebitInitiation,
            MessageType::CreditTransferInitiation,
        ] {
            let specs = fields(message_type);
            for (i, spec) in specs.iter().enumerate() {
                assert!(!spec.path.is_empty(), "{}", spec.key);
                assert!(
                    specs[i + 1..].iter().all(|other| other.key != spec.key),
                    "duplicate key {}",
                    spec.key
                );
            }
        }
    }

    #[test]
    fn test_header_party_follows_message_owner() {
        assert_eq!(header_elements(MessageType::DirectDebitInitiation).party, "Cdtr");
        assert_eq!(
            header_elements(MessageType::CreditTransferInitiation).agent,
            "DbtrAgt"
        );
    }
}
