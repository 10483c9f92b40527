//! Bank registry
//!
//! Immutable BIC → bank lookup built once from reference data (the bundled
//! `data/banks.csv` or an operator-supplied CSV file with the same header).
//! After construction nothing mutates the registry, so a shared reference can
//! be read from any number of threads without locking.

use crate::config::RegistryConfig;
use crate::types::{BankRecord, LookupPolicy};
use crate::{validation, Error, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

const BUNDLED_BANKS: &str = include_str!("../data/banks.csv");

/// Branch code of an institution's primary office
const PRIMARY_OFFICE: &str = "XXX";

/// Read-only BIC lookup table
#[derive(Debug, Clone)]
pub struct BankRegistry {
    banks: HashMap<String, BankRecord>,
    policy: LookupPolicy,
}

impl BankRegistry {
    /// Build from the configured data source
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        match &config.data_file {
            Some(path) => Self::from_path(path, config.lookup_policy),
            None => Self::bundled(config.lookup_policy),
        }
    }

    /// Build from the dataset compiled into the library
    pub fn bundled(policy: LookupPolicy) -> Result<Self> {
        Self::from_reader(BUNDLED_BANKS.as_bytes(), policy)
    }

    /// Build from a CSV file
    pub fn from_path(path: impl AsRef<Path>, policy: LookupPolicy) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            Error::Registry(format!("cannot open {}: {}", path.display(), e))
        })?;
        info!("Loading bank registry from {}", path.display());
        Self::from_reader(file, policy)
    }

    /// Build from CSV with header `bic,name,bank_code,city,country`
    pub fn from_reader<R: Read>(reader: R, policy: LookupPolicy) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut records = Vec::new();
        for (index, row) in csv_reader.deserialize::<BankRecord>().enumerate() {
            // Header is line 1
            let record = row.map_err(|e| Error::Registry(format!("row {}: {}", index + 2, e)))?;
            records.push(record);
        }

        Self::from_records(records, policy)
    }

    /// Build from already parsed records
    pub fn from_records(records: Vec<BankRecord>, policy: LookupPolicy) -> Result<Self> {
        let mut banks = HashMap::with_capacity(records.len());

        for record in records {
            if !validation::is_valid_bic(&record.bic) {
                warn!("Rejecting bank record with malformed BIC");
                return Err(Error::Registry(format!("invalid BIC '{}'", record.bic)));
            }
            if record.name.trim().is_empty() {
                return Err(Error::Registry(format!("empty bank name for {}", record.bic)));
            }
            let bic = record.bic.clone();
            if banks.insert(bic.clone(), record).is_some() {
                return Err(Error::Registry(format!("duplicate BIC '{}'", bic)));
            }
        }

        info!(banks = banks.len(), policy = ?policy, "Bank registry loaded");
        Ok(Self { banks, policy })
    }

    /// Look up a BIC according to the registry's policy
    pub fn lookup(&self, bic: &str) -> Option<&BankRecord> {
        if let Some(record) = self.banks.get(bic) {
            return Some(record);
        }
        if self.policy == LookupPolicy::Exact {
            return None;
        }

        let fallback = match (bic.len(), bic.get(..8)) {
            (11, Some(institution)) => self
                .banks
                .get(institution)
                .or_else(|| self.banks.get(&format!("{}{}", institution, PRIMARY_OFFICE))),
            (8, _) => self.banks.get(&format!("{}{}", bic, PRIMARY_OFFICE)),
            _ => None,
        };
        if fallback.is_some() {
            debug!("BIC resolved through primary office fallback");
        }
        fallback
    }

    /// Full bank record or `NotFound`
    pub fn bank(&self, bic: &str) -> Result<&BankRecord> {
        self.lookup(bic)
            .ok_or_else(|| Error::NotFound(format!("no bank registered for BIC '{}'", bic)))
    }

    /// Registered bank name or `NotFound`
    pub fn bank_name(&self, bic: &str) -> Result<&str> {
        self.bank(bic).map(|record| record.name.as_str())
    }

    /// Active lookup policy
    pub fn policy(&self) -> LookupPolicy {
        self.policy
    }

    /// Number of registered BICs
    pub fn len(&self) -> usize {
        self.banks.len()
    }

    /// Whether the registry holds no banks
    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }
}
