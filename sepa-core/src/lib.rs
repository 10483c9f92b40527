//! SEPA Core
//!
//! Builds and validates SEPA payment initiation messages (pain.008 direct
//! debits, pain.001 credit transfers) and serializes them to ISO 20022 XML.
//!
//! # Architecture
//!
//! - **Engine**: owns the bank registry, field validator and serializer
//! - **Messages**: caller-owned values, changed only through validating setters
//! - **Registry**: BIC reference data loaded once, read-only afterwards
//! - **IBAN tools**: MOD 97-10 checks and BBAN to IBAN conversion
//!
//! # Invariants
//!
//! - A rejected setter or batch leaves the message unchanged
//! - Extension fields only hold keys of the message type's schema
//! - Same message → same XML bytes

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod api;
pub mod checksum;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod iban;
pub mod message;
pub mod registry;
pub mod schema;
pub mod types;
pub mod validation;
pub mod xml;

// Re-exports
pub use config::{Config, RegistryConfig, XmlConfig};
pub use convert::IbanConversion;
pub use engine::Engine;
pub use error::{Error, FieldViolation, Result};
pub use message::Message;
pub use registry::BankRegistry;
pub use types::{BankRecord, ConversionStatus, LookupPolicy, MessageType};
pub use validation::FieldValidator;
pub use xml::XmlSerializer;
