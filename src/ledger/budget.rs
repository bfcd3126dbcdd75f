use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ledger::DateWindow;
use super::schedule::days_in_month;
use crate::errors::FinanceError;

/// Enumeration of budgeting periods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetPeriod {
    type Err = FinanceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(BudgetPeriod::Weekly),
            "monthly" => Ok(BudgetPeriod::Monthly),
            "yearly" => Ok(BudgetPeriod::Yearly),
            other => Err(FinanceError::Validation(format!(
                "unknown budget period `{}`",
                other
            ))),
        }
    }
}

/// A calendar month, serialized as `YYYY-MM`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct BudgetMonth {
    year: i32,
    month: u32,
}

impl BudgetMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, FinanceError> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(FinanceError::Validation(format!(
                "invalid month {:04}-{:02}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let last = days_in_month(self.year, self.month).unwrap_or(31);
        NaiveDate::from_ymd_opt(self.year, self.month, last).unwrap_or(NaiveDate::MAX)
    }

    /// Inclusive window from the first to the last day of the month.
    pub fn window(&self) -> DateWindow {
        DateWindow {
            start: self.first_day(),
            end: self.last_day(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for BudgetMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BudgetMonth {
    type Err = FinanceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid =
            || FinanceError::Validation(format!("invalid month `{}`, use YYYY-MM", value.trim()));
        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        BudgetMonth::new(year, month)
    }
}

impl TryFrom<String> for BudgetMonth {
    type Error = FinanceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BudgetMonth> for String {
    fn from(month: BudgetMonth) -> Self {
        month.to_string()
    }
}

/// A spending guardrail for one category in one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub amount: f64,
    #[serde(default)]
    pub period: BudgetPeriod,
    pub month: BudgetMonth,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(user_id: Uuid, category_id: Uuid, amount: f64, month: BudgetMonth) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            category_id,
            amount,
            period: BudgetPeriod::Monthly,
            month,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_period(mut self, period: BudgetPeriod) -> Self {
        self.period = period;
        self
    }

    /// Identity used to detect duplicate budgets.
    pub fn key(&self) -> (Uuid, Uuid, BudgetMonth, BudgetPeriod) {
        (self.user_id, self.category_id, self.month, self.period)
    }
}

/// Budgeted versus spent for a single budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub budget_id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub budgeted_amount: f64,
    pub spent_amount: f64,
    pub remaining_amount: f64,
    pub period: BudgetPeriod,
    pub month: BudgetMonth,
}

/// Source of expense totals for budget aggregation.
pub trait ExpenseLookup {
    /// Sum of the user's expense transactions in `category_id` dated within `window`.
    fn sum_expenses(&self, user_id: Uuid, category_id: Uuid, window: DateWindow) -> f64;
}

/// Builds one summary row per monthly budget the user holds for `month`.
pub fn summarize_month<L, N>(
    user_id: Uuid,
    month: BudgetMonth,
    budgets: &[Budget],
    category_name: N,
    lookup: &L,
) -> Vec<BudgetSummary>
where
    L: ExpenseLookup + ?Sized,
    N: Fn(Uuid) -> Option<String>,
{
    let window = month.window();
    let mut rows: Vec<BudgetSummary> = budgets
        .iter()
        .filter(|budget| {
            budget.user_id == user_id
                && budget.month == month
                && budget.period == BudgetPeriod::Monthly
        })
        .map(|budget| {
            let spent = lookup.sum_expenses(user_id, budget.category_id, window);
            BudgetSummary {
                budget_id: budget.id,
                category_id: budget.category_id,
                category_name: category_name(budget.category_id).unwrap_or_else(|| "N/A".into()),
                budgeted_amount: budget.amount,
                spent_amount: spent,
                remaining_amount: budget.amount - spent,
                period: budget.period,
                month: budget.month,
            }
        })
        .collect();
    rows.sort_by(|a, b| a.category_name.cmp(&b.category_name));
    rows
}
