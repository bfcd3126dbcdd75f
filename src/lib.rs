#![doc(test(attr(deny(warnings))))]

//! Finance Tracker core: users, transactions, budgets, savings goals and
//! recurring transactions over a JSON-persisted ledger.
//!
//! The recurrence scheduler lives in [`ledger::schedule`] and
//! [`ledger::recurring`]; request handlers call into [`core::services`]
//! through a [`core::LedgerManager`].

pub mod auth;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

pub use errors::{FinanceError, ScheduleError};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Finance tracker tracing initialized.");
    });
}
