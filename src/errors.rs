use std::result::Result as StdResult;

use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised by recurrence period arithmetic and projection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Invalid frequency: `{0}` (expected daily, weekly, monthly or yearly)")]
    InvalidFrequency(String),
    #[error("Invalid interval: {0} (must be a positive integer)")]
    InvalidInterval(i64),
    /// Period arithmetic failed to move strictly forward. This is a defect in
    /// the calendar math, never a consequence of user input.
    #[error("Scheduler inconsistency: period starting {base} did not advance")]
    Inconsistency { base: NaiveDate },
}

impl ScheduleError {
    pub fn is_defect(&self) -> bool {
        matches!(self, ScheduleError::Inconsistency { .. })
    }
}

/// Error type shared by the domain model, storage and configuration layers.
#[derive(Debug, Error)]
pub enum FinanceError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("Invalid amount: {0} (must be a positive number)")]
    InvalidAmount(f64),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Credential error: {0}")]
    Credential(String),
}

impl FinanceError {
    pub fn is_defect(&self) -> bool {
        matches!(self, FinanceError::Schedule(err) if err.is_defect())
    }
}

pub type Result<T> = StdResult<T, FinanceError>;

impl From<std::io::Error> for FinanceError {
    fn from(err: std::io::Error) -> Self {
        FinanceError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for FinanceError {
    fn from(err: serde_json::Error) -> Self {
        FinanceError::Storage(err.to_string())
    }
}
