pub mod json_backend;

use crate::{errors::Result, ledger::Ledger};

/// Abstraction over persistence backends capable of storing ledgers and snapshots.
pub trait StorageBackend: Send + Sync {
    fn save(&self, ledger: &Ledger, name: &str) -> Result<()>;
    fn load(&self, name: &str) -> Result<Ledger>;
    fn exists(&self, name: &str) -> bool;
    /// Backup file names for `name`, newest first.
    fn list_backups(&self, name: &str) -> Result<Vec<String>>;
    /// Writes a snapshot of `ledger` and returns the backup file name.
    fn backup(&self, ledger: &Ledger, name: &str, note: Option<&str>) -> Result<String>;
    fn restore(&self, name: &str, backup_name: &str) -> Result<Ledger>;
}

pub use json_backend::{load_ledger_from_path, save_ledger_to_path, JsonStorage};
