//! Ledger domain models, persistence-friendly types, and helpers.

pub mod budget;
pub mod category;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod recurring;
pub mod savings_goal;
pub mod schedule;
pub mod transaction;
pub mod user;

pub use budget::{summarize_month, Budget, BudgetMonth, BudgetPeriod, BudgetSummary, ExpenseLookup};
pub use category::{Category, DEFAULT_CATEGORIES};
pub use ledger::{DateWindow, Ledger};
pub use recurring::{project_schedule, RecurrenceSchedule, RecurringTransaction, ScheduleProjection};
pub use savings_goal::{GoalPriority, SavingsGoal};
pub use schedule::{advance_once, Frequency, Interval, Period};
pub use transaction::{Transaction, TransactionKind};
pub use user::User;

use crate::errors::FinanceError;

/// Accepts finite, strictly positive monetary amounts.
pub fn validate_amount(amount: f64) -> Result<f64, FinanceError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(FinanceError::InvalidAmount(amount))
    }
}
