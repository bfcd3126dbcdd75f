use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::services::{TransactionFilter, DEFAULT_LIST_LIMIT},
    errors::{FinanceError, Result},
    storage::json_backend::{write_atomic, DEFAULT_RETENTION},
    utils::paths::{self, ensure_dir},
};

/// User-level settings persisted as `config.json` in the app data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_transaction_limit: usize,
    pub backup_retention: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_ledger: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_transaction_limit: DEFAULT_LIST_LIMIT,
            backup_retention: DEFAULT_RETENTION,
            last_opened_ledger: None,
        }
    }
}

impl Config {
    /// Unfiltered transaction listing sized by `default_transaction_limit`.
    pub fn transaction_filter(&self) -> TransactionFilter {
        TransactionFilter {
            limit: Some(self.default_transaction_limit),
            ..TransactionFilter::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.default_transaction_limit == 0 {
            return Err(FinanceError::Config(
                "default_transaction_limit must be at least 1".into(),
            ));
        }
        if self.backup_retention == 0 {
            return Err(FinanceError::Config(
                "backup_retention must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(paths::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: paths::config_file_in(&base),
            base,
        })
    }

    /// Reads the stored config, falling back to defaults when none exists yet.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)
            .map_err(|err| FinanceError::Config(format!("{}: {}", self.path.display(), err)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
