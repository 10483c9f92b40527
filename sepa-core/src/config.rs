//! Configuration for the SEPA engine

use crate::types::LookupPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest accepted XML indentation
const MAX_INDENT_WIDTH: usize = 8;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Bank registry configuration
    pub registry: RegistryConfig,

    /// XML output configuration
    pub xml: XmlConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "sepa-core".to_string(),
            registry: RegistryConfig::default(),
            xml: XmlConfig::default(),
        }
    }
}

/// Bank registry configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// CSV file with bank records; the bundled dataset when unset
    pub data_file: Option<PathBuf>,

    /// BIC lookup policy
    pub lookup_policy: LookupPolicy,
}

/// XML output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlConfig {
    /// Indent nested elements
    pub pretty_print: bool,

    /// Spaces per nesting level when pretty printing
    pub indent_width: usize,

    /// Emit the `<?xml ...?>` declaration
    pub declaration: bool,
}

impl Default for XmlConfig {
    fn default() -> Self {
        Self {
            pretty_print: true,
            indent_width: 2,
            declaration: true,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(path) = std::env::var("SEPA_BANK_REGISTRY") {
            config.registry.data_file = Some(PathBuf::from(path));
        }

        if let Ok(policy) = std::env::var("SEPA_BIC_LOOKUP") {
            config.registry.lookup_policy = policy.parse()?;
        }

        if let Ok(pretty) = std::env::var("SEPA_XML_PRETTY") {
            config.xml.pretty_print = pretty.parse().map_err(|_| {
                Error::Config(format!("SEPA_XML_PRETTY must be true or false, got '{}'", pretty))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.xml.indent_width > MAX_INDENT_WIDTH {
            return Err(Error::Config(format!(
                "xml.indent_width {} exceeds maximum of {}",
                self.xml.indent_width, MAX_INDENT_WIDTH
            )));
        }
        Ok(())
    }
}
