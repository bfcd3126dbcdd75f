#![allow(dead_code)]

use chrono::NaiveDate;
use finance_tracker::{
    auth::{Pbkdf2PasswordHasher, UserContext},
    core::{services::UserService, LedgerManager},
    ledger::Ledger,
    storage::JsonStorage,
};
use tempfile::TempDir;

/// Cheap round count; production code uses `Pbkdf2PasswordHasher::default()`.
pub const HASHER: Pbkdf2PasswordHasher = Pbkdf2PasswordHasher::with_rounds(1_000);

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar date")
}

/// Ledger with default categories and one registered user.
pub fn ledger_with_user(username: &str) -> (Ledger, UserContext) {
    let mut ledger = Ledger::with_default_categories("Integration");
    let ctx = signup(&mut ledger, username);
    (ledger, ctx)
}

pub fn signup(ledger: &mut Ledger, username: &str) -> UserContext {
    UserService::signup(
        ledger,
        &HASHER,
        username,
        &format!("{username}@example.com"),
        "correct-horse",
    )
    .expect("signup succeeds")
}

/// Manager backed by a fresh temporary directory. Keep the guard alive for the test.
pub fn temp_manager(name: &str) -> (LedgerManager, TempDir) {
    let temp = TempDir::new().expect("create temp dir");
    let storage =
        JsonStorage::new(Some(temp.path().to_path_buf()), Some(3)).expect("create json storage");
    let manager = LedgerManager::open(Box::new(storage), name).expect("open ledger");
    (manager, temp)
}
