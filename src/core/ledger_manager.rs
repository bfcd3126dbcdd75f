use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::Config;
use crate::errors::{FinanceError, Result};
use crate::ledger::ledger::CURRENT_SCHEMA_VERSION;
use crate::ledger::Ledger;
use crate::storage::{JsonStorage, StorageBackend};

pub const DEFAULT_LEDGER_NAME: &str = "default";

/// Facade that owns the live ledger and keeps it in step with storage.
///
/// Every mutation goes through [`LedgerManager::transact`], which applies the
/// change to a copy, persists the copy, and only then replaces the live
/// ledger. A failed operation or a failed save leaves both untouched.
pub struct LedgerManager {
    current: Ledger,
    name: String,
    storage: Box<dyn StorageBackend>,
}

impl LedgerManager {
    /// Loads the ledger stored under `name`, creating and saving a fresh one
    /// seeded with the default categories when none exists.
    pub fn open(storage: Box<dyn StorageBackend>, name: &str) -> Result<Self> {
        let current = if storage.exists(name) {
            let ledger = storage.load(name)?;
            ensure_schema_support(ledger.schema_version)?;
            debug!(ledger = %name, transactions = ledger.transaction_count(), "loaded ledger");
            ledger
        } else {
            let ledger = Ledger::with_default_categories(name);
            storage.save(&ledger, name)?;
            info!(ledger = %name, "created new ledger");
            ledger
        };
        Ok(Self {
            current,
            name: name.to_string(),
            storage,
        })
    }

    /// Opens the last used ledger with a JSON store rooted at `root`
    /// (the app data directory when `None`).
    pub fn from_config(config: &Config, root: Option<PathBuf>) -> Result<Self> {
        let storage = JsonStorage::new(root, Some(config.backup_retention))?;
        let name = config
            .last_opened_ledger
            .as_deref()
            .unwrap_or(DEFAULT_LEDGER_NAME);
        Self::open(Box::new(storage), name)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.current
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `op` against a copy of the ledger and commits it only if both the
    /// operation and the save succeed.
    pub fn transact<T, E, F>(&mut self, op: F) -> std::result::Result<T, E>
    where
        E: From<FinanceError>,
        F: FnOnce(&mut Ledger) -> std::result::Result<T, E>,
    {
        let mut draft = self.current.clone();
        let value = op(&mut draft)?;
        self.storage.save(&draft, &self.name)?;
        self.current = draft;
        Ok(value)
    }

    pub fn backup(&self, note: Option<&str>) -> Result<String> {
        self.storage.backup(&self.current, &self.name, note)
    }

    pub fn list_backups(&self) -> Result<Vec<String>> {
        self.storage.list_backups(&self.name)
    }

    /// Replaces the live ledger with the named backup.
    pub fn restore(&mut self, backup_name: &str) -> Result<()> {
        let ledger = self.storage.restore(&self.name, backup_name)?;
        ensure_schema_support(ledger.schema_version)?;
        self.current = ledger;
        Ok(())
    }
}

fn ensure_schema_support(schema_version: u8) -> Result<()> {
    if schema_version > CURRENT_SCHEMA_VERSION {
        return Err(FinanceError::Storage(format!(
            "ledger schema v{} is newer than supported v{}",
            schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(())
}
