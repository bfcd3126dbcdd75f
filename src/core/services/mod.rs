pub mod budget_service;
pub mod category_service;
pub mod recurring_service;
pub mod savings_goal_service;
pub mod summary_service;
pub mod transaction_service;
pub mod user_service;

pub use budget_service::{BudgetPatch, BudgetService, NewBudget};
pub use category_service::CategoryService;
pub use recurring_service::{
    NewRecurring, RecurringPatch, RecurringService, MAX_MATERIALIZED_PER_RUN,
};
pub use savings_goal_service::{NewSavingsGoal, SavingsGoalPatch, SavingsGoalService};
pub use summary_service::{CategorySpending, Dashboard, SummaryService};
pub use transaction_service::{
    NewTransaction, TransactionFilter, TransactionPatch, TransactionService, DEFAULT_LIST_LIMIT,
};
pub use user_service::{UserPatch, UserProfile, UserService};

use crate::errors::{FinanceError, ScheduleError};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] FinanceError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Authentication required")]
    Unauthorized,
    #[error("{0}")]
    Invalid(String),
}

impl From<ScheduleError> for ServiceError {
    fn from(err: ScheduleError) -> Self {
        ServiceError::Core(FinanceError::Schedule(err))
    }
}

impl ServiceError {
    /// True for internal defects that a request layer should report as a
    /// server error rather than a rejected request.
    pub fn is_defect(&self) -> bool {
        matches!(self, ServiceError::Core(err) if err.is_defect())
    }

    pub(crate) fn not_found(entity: &str) -> Self {
        ServiceError::NotFound(entity.to_string())
    }
}

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn required_text(value: &str, field: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ServiceError::Invalid(format!("{} cannot be empty", field)))
    } else {
        Ok(trimmed.to_string())
    }
}
