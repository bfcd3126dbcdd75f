use dirs::home_dir;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::errors::Result;

pub const HOME_ENV: &str = "FINANCE_TRACKER_HOME";
const DEFAULT_DIR_NAME: &str = ".finance_tracker";
const LEDGER_DIR: &str = "ledgers";
const BACKUP_DIR: &str = "backups";
const CONFIG_FILE: &str = "config.json";

/// Application data directory: `$FINANCE_TRACKER_HOME`, else `~/.finance_tracker`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn resolve_base(root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(app_data_dir)
}

pub fn ledgers_dir_in(base: &Path) -> PathBuf {
    base.join(LEDGER_DIR)
}

pub fn backups_dir_in(base: &Path) -> PathBuf {
    base.join(BACKUP_DIR)
}

pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Lower-case file-system slug for a ledger name.
pub fn slug(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "ledger".into()
    } else {
        sanitized
    }
}
