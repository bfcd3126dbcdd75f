use chrono::Utc;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    errors::{FinanceError, Result},
    ledger::Ledger,
    utils::paths::{self, ensure_dir, slug},
};

use super::StorageBackend;

const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const TMP_SUFFIX: &str = "tmp";
pub const DEFAULT_RETENTION: usize = 5;

/// File-system store keeping one pretty-printed JSON document per ledger.
///
/// Layout under the root directory:
/// `ledgers/<slug>.json` for live ledgers and `backups/<slug>/` for snapshots.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
    ledgers_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let app_root = paths::resolve_base(root);
        let ledgers_dir = paths::ledgers_dir_in(&app_root);
        let backups_dir = paths::backups_dir_in(&app_root);
        ensure_dir(&ledgers_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            root: app_root,
            ledgers_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn ledger_path(&self, name: &str) -> PathBuf {
        self.ledgers_dir.join(format!("{}.json", slug(name)))
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(slug(name))
    }

    pub fn backup_path(&self, name: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(name).join(backup_name)
    }

    fn backup_file_name(name: &str, note: Option<&str>) -> String {
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
        let nonce = Uuid::new_v4().simple().to_string();
        let mut stem = format!("{}_{}_{}", slug(name), timestamp, &nonce[..8]);
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        format!("{}.{}", stem, BACKUP_EXTENSION)
    }

    /// Copies the current on-disk ledger aside before it is overwritten.
    fn backup_existing_file(&self, name: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let backup_path = dir.join(Self::backup_file_name(name, None));
        fs::copy(path, &backup_path)?;
        debug!(backup = %backup_path.display(), "backed up previous ledger file");
        self.prune_backups(name)
    }

    fn prune_backups(&self, name: &str) -> Result<()> {
        let backups = self.list_backups(name)?;
        for entry in backups.iter().skip(self.retention) {
            let path = self.backup_path(name, entry);
            if let Err(err) = fs::remove_file(&path) {
                warn!(backup = %path.display(), error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, ledger: &Ledger, name: &str) -> Result<()> {
        let path = self.ledger_path(name);
        self.backup_existing_file(name, &path)?;
        save_ledger_to_path(ledger, &path)
    }

    fn load(&self, name: &str) -> Result<Ledger> {
        let path = self.ledger_path(name);
        if !path.exists() {
            return Err(FinanceError::Storage(format!("ledger `{}` not found", name)));
        }
        load_ledger_from_path(&path)
    }

    fn exists(&self, name: &str) -> bool {
        self.ledger_path(name).exists()
    }

    fn list_backups(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|stem| stem.to_str()) {
                entries.push(file_name.to_string());
            }
        }
        // Fixed-width timestamps make name order chronological.
        entries.sort_by(|a, b| b.cmp(a));
        Ok(entries)
    }

    fn backup(&self, ledger: &Ledger, name: &str, note: Option<&str>) -> Result<String> {
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let file_name = Self::backup_file_name(name, note);
        let json = serde_json::to_string_pretty(ledger)?;
        write_atomic(&dir.join(&file_name), &json)?;
        info!(ledger = %name, backup = %file_name, "created ledger backup");
        self.prune_backups(name)?;
        Ok(file_name)
    }

    fn restore(&self, name: &str, backup_name: &str) -> Result<Ledger> {
        if backup_name.contains(['/', '\\']) || backup_name.starts_with('.') {
            return Err(FinanceError::Storage(format!(
                "invalid backup name `{}`",
                backup_name
            )));
        }
        let backup_path = self.backup_path(name, backup_name);
        if !backup_path.exists() {
            return Err(FinanceError::Storage(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let ledger = load_ledger_from_path(&backup_path)?;
        let target = self.ledger_path(name);
        self.backup_existing_file(name, &target)?;
        save_ledger_to_path(&ledger, &target)?;
        info!(ledger = %name, backup = %backup_name, "restored ledger from backup");
        Ok(ledger)
    }
}

pub fn save_ledger_to_path(ledger: &Ledger, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(ledger)?;
    write_atomic(path, &json)
}

pub fn load_ledger_from_path(path: &Path) -> Result<Ledger> {
    let data = fs::read_to_string(path)?;
    let ledger: Ledger = serde_json::from_str(&data)?;
    Ok(ledger)
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Stages `data` next to `path` and renames it into place.
pub(crate) fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage_with_temp_dir(retention: usize) -> (JsonStorage, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let storage = JsonStorage::new(Some(temp.path().to_path_buf()), Some(retention))
            .expect("json storage");
        (storage, temp)
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (storage, _guard) = storage_with_temp_dir(3);
        let ledger = Ledger::with_default_categories("Sample");
        storage.save(&ledger, "Household").expect("save ledger");
        assert!(storage.exists("household"));
        let loaded = storage.load("Household").expect("load ledger");
        assert_eq!(loaded.name, "Sample");
        assert_eq!(loaded.categories.len(), ledger.categories.len());
        assert!(!tmp_path(&storage.ledger_path("Household")).exists());
    }

    #[test]
    fn missing_ledger_is_a_storage_error() {
        let (storage, _guard) = storage_with_temp_dir(3);
        assert!(matches!(storage.load("ghost"), Err(FinanceError::Storage(_))));
    }

    #[test]
    fn overwrite_keeps_previous_version_and_prunes() {
        let (storage, _guard) = storage_with_temp_dir(2);
        let mut ledger = Ledger::new("Rolling");
        for _ in 0..5 {
            ledger.touch();
            storage.save(&ledger, "rolling").unwrap();
        }
        let backups = storage.list_backups("rolling").unwrap();
        assert_eq!(backups.len(), 2);
        assert!(backups[0] >= backups[1]);
    }

    #[test]
    fn backup_names_carry_sanitized_note() {
        let (storage, _guard) = storage_with_temp_dir(3);
        let ledger = Ledger::new("Family");
        storage.save(&ledger, "family").unwrap();
        let name = storage
            .backup(&ledger, "family", Some("  Quarter Close!! "))
            .expect("create backup");
        assert!(name.starts_with("family_"));
        assert!(name.ends_with("_quarter-close.json"), "unexpected name {name}");
        assert_eq!(storage.list_backups("family").unwrap(), vec![name]);
    }

    #[test]
    fn restore_replaces_live_ledger() {
        let (storage, _guard) = storage_with_temp_dir(5);
        let original = Ledger::new("Before");
        storage.save(&original, "main").unwrap();
        let backup = storage.backup(&original, "main", None).unwrap();

        let mut changed = original.clone();
        changed.name = "After".into();
        storage.save(&changed, "main").unwrap();

        let restored = storage.restore("main", &backup).unwrap();
        assert_eq!(restored.name, "Before");
        assert_eq!(storage.load("main").unwrap().name, "Before");
        assert!(storage.restore("main", "../escape.json").is_err());
    }
}
