//! Process-wide operation surface
//!
//! A binding layer calls [`initialize`] once, then uses the free functions
//! below. Initialization is explicit and idempotent: the first successful call
//! installs the engine, later calls return `Ok(())` without reloading.
//! Operations that need the bank registry fail with [`Error::NotInitialized`]
//! until then. `check_iban` and `iban_convert` are pure and always available.

use crate::config::Config;
use crate::convert::{self, IbanConversion};
use crate::engine::Engine;
use crate::message::Message;
use crate::types::{BankRecord, MessageType};
use crate::{iban, Error, Result};
use std::sync::OnceLock;
use tracing::{info, warn};

static ENGINE: OnceLock<Engine> = OnceLock::new();

/// Build and install the process-wide engine
pub fn initialize(config: &Config) -> Result<()> {
    if ENGINE.get().is_some() {
        return Ok(());
    }

    let engine = Engine::new(config.clone()).map_err(|e| {
        warn!(error = %e, "SEPA engine initialization failed");
        e
    })?;

    // A concurrent initializer may have won; its engine stays
    if ENGINE.set(engine).is_ok() {
        info!("Process-wide SEPA engine installed");
    }
    Ok(())
}

/// Whether [`initialize`] has completed
pub fn is_initialized() -> bool {
    ENGINE.get().is_some()
}

/// The process-wide engine
pub fn engine() -> Result<&'static Engine> {
    ENGINE.get().ok_or(Error::NotInitialized)
}

/// Create an empty message
pub fn create_message<T>(message_type: T) -> Result<Message>
where
    T: TryInto<MessageType>,
    Error: From<T::Error>,
{
    engine()?.create_message(message_type)
}

/// Set the account holder name
pub fn set_name(message: &mut Message, name: &str) -> Result<()> {
    engine()?.set_name(message, name)
}

/// Set the account IBAN
pub fn set_iban(message: &mut Message, iban: &str) -> Result<()> {
    engine()?.set_iban(message, iban)
}

/// Set the agent BIC
pub fn set_bic(message: &mut Message, bic: &str) -> Result<()> {
    engine()?.set_bic(message, bic)
}

/// Add a batch of extension fields
pub fn add<K, V>(message: &mut Message, entries: &[(K, V)]) -> Result<()>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    engine()?.add(message, entries)
}

/// Serialize a message
pub fn to_xml(message: &mut Message) -> Result<String> {
    engine()?.to_xml(message)
}

/// IBAN checksum and format check
pub fn check_iban(iban: &str) -> bool {
    iban::is_valid(iban)
}

/// Bank name for a BIC
pub fn bic_get_bank_name(bic: &str) -> Result<&'static str> {
    engine()?.bic_get_bank_name(bic)
}

/// Registry record for a BIC
pub fn bic_get_bank(bic: &str) -> Result<&'static BankRecord> {
    engine()?.bic_get_bank(bic)
}

/// Derive an IBAN
pub fn iban_convert(country_code: &str, account_id: &str, bank_id: &str) -> Result<IbanConversion> {
    convert::convert(country_code, account_id, bank_id)
}
