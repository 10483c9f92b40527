//! SEPA engine
//!
//! Owns the immutable pieces (bank registry, field validator, serializer) and
//! implements the message and lookup operations on top of them. An engine is
//! `Send + Sync`; messages are plain values owned by the caller.

use crate::config::Config;
use crate::convert::{self, IbanConversion};
use crate::message::Message;
use crate::registry::BankRegistry;
use crate::types::{BankRecord, MessageType};
use crate::validation::FieldValidator;
use crate::xml::XmlSerializer;
use crate::{iban, Error, Result};
use tracing::{debug, info};

/// Message builder and lookup engine
#[derive(Debug, Clone)]
pub struct Engine {
    config: Config,
    registry: BankRegistry,
    validator: FieldValidator,
    serializer: XmlSerializer,
}

impl Engine {
    /// Build an engine, loading the configured bank registry
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let registry = BankRegistry::from_config(&config.registry)?;
        Self::with_registry(config, registry)
    }

    /// Build an engine around an already loaded registry
    pub fn with_registry(config: Config, registry: BankRegistry) -> Result<Self> {
        let validator = FieldValidator::new()?;
        let serializer = XmlSerializer::new(config.xml.clone());

        info!(
            service = %config.service_name,
            banks = registry.len(),
            "SEPA engine initialized"
        );

        Ok(Self {
            config,
            registry,
            validator,
            serializer,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bank registry
    pub fn registry(&self) -> &BankRegistry {
        &self.registry
    }

    // =========================================================================
    // MESSAGE OPERATIONS
    // =========================================================================

    /// Create an empty message; accepts a `MessageType`, its numeric code or
    /// one of its textual names
    pub fn create_message<T>(&self, message_type: T) -> Result<Message>
    where
        T: TryInto<MessageType>,
        Error: From<T::Error>,
    {
        let message_type = message_type.try_into()?;
        debug!(message_type = %message_type, "Message created");
        Ok(Message::new(message_type))
    }

    /// Set the account holder name
    pub fn set_name(&self, message: &mut Message, name: &str) -> Result<()> {
        let result = self.validator.validate_name(name);
        apply(message, result, |m| m.set_name(name), "name")
    }

    /// Set the account IBAN
    pub fn set_iban(&self, message: &mut Message, iban: &str) -> Result<()> {
        let result = self.validator.validate_iban(iban);
        apply(message, result, |m| m.set_iban(iban), "iban")
    }

    /// Set the agent BIC
    pub fn set_bic(&self, message: &mut Message, bic: &str) -> Result<()> {
        let result = self.validator.validate_bic(bic);
        apply(message, result, |m| m.set_bic(bic), "bic")
    }

    /// Add a batch of extension fields; all or nothing
    pub fn add<K, V>(&self, message: &mut Message, entries: &[(K, V)]) -> Result<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let result = self
            .validator
            .validate_fields(message.message_type(), entries);
        apply(message, result, |m| m.merge_fields(entries), "fields")
    }

    /// Serialize the message to ISO 20022 XML
    pub fn to_xml(&self, message: &mut Message) -> Result<String> {
        match self.serializer.serialize(message) {
            Ok(xml) => {
                message.clear_error();
                Ok(xml)
            }
            Err(e) => {
                debug!(error = %e, "Serialization rejected");
                message.record_error(&e);
                Err(e)
            }
        }
    }

    // =========================================================================
    // STATELESS OPERATIONS
    // =========================================================================

    /// Whether `iban` is a well-formed IBAN with a valid checksum
    pub fn check_iban(&self, iban: &str) -> bool {
        iban::is_valid(iban)
    }

    /// Name of the bank registered for `bic`
    pub fn bic_get_bank_name(&self, bic: &str) -> Result<&str> {
        self.registry.bank_name(bic)
    }

    /// Full registry record for `bic`
    pub fn bic_get_bank(&self, bic: &str) -> Result<&BankRecord> {
        self.registry.bank(bic)
    }

    /// Derive an IBAN from country, account and bank identifiers
    pub fn iban_convert(
        &self,
        country_code: &str,
        account_id: &str,
        bank_id: &str,
    ) -> Result<IbanConversion> {
        convert::convert(country_code, account_id, bank_id)
    }
}

/// Write on success, record the failure otherwise
fn apply<F>(message: &mut Message, result: Result<()>, write: F, what: &str) -> Result<()>
where
    F: FnOnce(&mut Message),
{
    match result {
        Ok(()) => {
            write(message);
            message.clear_error();
            debug!(field = what, message_type = %message.message_type(), "Message updated");
            Ok(())
        }
        Err(e) => {
            debug!(field = what, keys = ?e.offending_keys(), "Message update rejected");
            message.record_error(&e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConversionStatus, LookupPolicy};

    fn engine() -> Engine {
        Engine::new(Config::default()).unwrap()
    }

    #[test]
    fn test_create_message_forms() {
        let engine = engine();
        assert_eq!(
            engine.create_message(1i64).unwrap().message_type(),
            MessageType::DirectDebitInitiation
        );
        assert_eq!(
            engine.create_message("cti").unwrap().message_type(),
            MessageType::CreditTransferInitiation
        );
        assert_eq!(
            engine
                .create_message(MessageType::DirectDebitInitiation)
                .unwrap()
                .message_type(),
            MessageType::DirectDebitInitiation
        );
        assert!(matches!(engine.create_message(7i64), Err(Error::InvalidArgument(_))));
        assert!(matches!(engine.create_message("pacs.008"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_failed_setter_keeps_previous_value() {
        let engine = engine();
        let mut msg = engine.create_message(1i64).unwrap();

        engine.set_iban(&mut msg, "DE89370400440532013000").unwrap();
        assert!(msg.last_error().is_none());

        let err = engine.set_iban(&mut msg, "DE89370400440532013001").unwrap_err();
        assert!(matches!(err, Error::InvalidField { .. }));
        assert_eq!(msg.iban(), Some("DE89370400440532013000"));
        assert!(msg.last_error().unwrap().contains("iban"));

        engine.set_name(&mut msg, "ACME Corp").unwrap();
        assert!(msg.last_error().is_none());
    }

    #[test]
    fn test_invalid_name_and_bic() {
        let engine = engine();
        let mut msg = engine.create_message(2i64).unwrap();

        assert!(engine.set_name(&mut msg, &"x".repeat(71)).is_err());
        assert!(msg.name().is_none());
        assert!(engine.set_bic(&mut msg, "COBADEFFX").is_err());
        assert!(msg.bic().is_none());
        assert!(msg.last_error().unwrap().contains("bic"));
    }

    #[test]
    fn test_add_is_atomic() {
        let engine = engine();
        let mut msg = engine.create_message(1i64).unwrap();
        engine.add(&mut msg, &[("mandate_id", "M-1")]).unwrap();

        let before = msg.fields().to_vec();
        let err = engine
            .add(&mut msg, &[("amount", "10.00"), ("colour", "blue")])
            .unwrap_err();
        assert_eq!(err.offending_keys(), vec!["colour"]);
        assert_eq!(msg.fields(), before.as_slice());
        assert!(msg.last_error().unwrap().contains("colour"));
    }

    #[test]
    fn test_non_canonical_values_never_reach_xml() {
        let engine = engine();
        let mut msg = engine.create_message(1i64).unwrap();
        engine.set_name(&mut msg, "ACME Corp").unwrap();
        engine.set_iban(&mut msg, "DE89370400440532013000").unwrap();
        engine.set_bic(&mut msg, "COBADEFFXXX").unwrap();
        engine.add(&mut msg, &[("mandate_id", "M-1")]).unwrap();

        let err = engine
            .add(
                &mut msg,
                &[
                    ("amount", "1_000.00"),
                    ("collection_date", "-999-01-01"),
                    ("debtor_name", "   "),
                ],
            )
            .unwrap_err();
        assert_eq!(
            err.offending_keys(),
            vec!["amount", "collection_date", "debtor_name"]
        );
        assert!(engine.set_name(&mut msg, "   ").is_err());
        assert_eq!(msg.name(), Some("ACME Corp"));

        let xml = engine.to_xml(&mut msg).unwrap();
        assert!(!xml.contains("InstdAmt"));
        assert!(!xml.contains("ReqdColltnDt"));
    }

    #[test]
    fn test_to_xml_records_missing_field() {
        let engine = engine();
        let mut msg = engine.create_message(1i64).unwrap();
        engine.set_name(&mut msg, "ACME Corp").unwrap();

        assert!(matches!(engine.to_xml(&mut msg), Err(Error::MissingField(f)) if f == "iban"));
        assert_eq!(msg.last_error(), Some("Missing required field: iban"));
    }

    #[test]
    fn test_message_editable_after_serialization() {
        let engine = engine();
        let mut msg = engine.create_message(2i64).unwrap();
        engine.set_name(&mut msg, "ACME Corp").unwrap();
        engine.set_iban(&mut msg, "GB29NWBK60161331926819").unwrap();
        engine.set_bic(&mut msg, "NWBKGB2L").unwrap();
        engine.add(&mut msg, &[("end_to_end_id", "E2E-1")]).unwrap();

        let first = engine.to_xml(&mut msg).unwrap();
        engine.set_name(&mut msg, "ACME Holdings").unwrap();
        let second = engine.to_xml(&mut msg).unwrap();

        assert!(first.contains("ACME Corp"));
        assert!(second.contains("ACME Holdings"));
        assert!(!second.contains("ACME Corp"));
    }

    #[test]
    fn test_lookups() {
        let engine = engine();
        assert!(engine.check_iban("DE89370400440532013000"));
        assert!(!engine.check_iban("DE89370400440532013001"));
        assert_eq!(engine.bic_get_bank_name("COBADEFFXXX").unwrap(), "Commerzbank AG");
        assert_eq!(engine.bic_get_bank("COBADEFFXXX").unwrap().country, "DE");
        assert!(!engine.registry().is_empty());
        assert_eq!(engine.registry().policy(), LookupPolicy::Exact);
        assert!(matches!(engine.bic_get_bank_name("ZZZZDEFFXXX"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_configured_lookup_policy() {
        let mut config = Config::default();
        config.registry.lookup_policy = LookupPolicy::PrefixFallback;
        let engine = Engine::new(config).unwrap();
        assert_eq!(engine.bic_get_bank_name("COBADEFF380").unwrap(), "Commerzbank AG");
    }

    #[test]
    fn test_iban_convert() {
        let engine = engine();
        let conversion = engine.iban_convert("DE", "532013000", "37040044").unwrap();
        assert_eq!(conversion.iban, "DE89370400440532013000");
        assert_eq!(conversion.status, ConversionStatus::Padded);
        assert!(engine.check_iban(&conversion.iban));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.xml.indent_width = 9;
        assert!(matches!(Engine::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Engine>();
    }
}
