use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validate_amount;
use crate::errors::FinanceError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl GoalPriority {
    /// Position in display order; high priority sorts first.
    pub fn rank(&self) -> u8 {
        match self {
            GoalPriority::High => 1,
            GoalPriority::Medium => 2,
            GoalPriority::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalPriority::Low => "low",
            GoalPriority::Medium => "medium",
            GoalPriority::High => "high",
        }
    }
}

impl fmt::Display for GoalPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalPriority {
    type Err = FinanceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(GoalPriority::Low),
            "medium" => Ok(GoalPriority::Medium),
            "high" => Ok(GoalPriority::High),
            _ => Err(FinanceError::Validation(
                "priority must be 'low', 'medium', or 'high'".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: GoalPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavingsGoal {
    pub fn new(user_id: Uuid, name: impl Into<String>, target_amount: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            target_amount,
            current_amount: 0.0,
            target_date: None,
            description: String::new(),
            priority: GoalPriority::Medium,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds a positive contribution. Overshooting the target is allowed.
    pub fn contribute(&mut self, amount: f64) -> Result<f64, FinanceError> {
        let amount = validate_amount(amount)?;
        self.current_amount += amount;
        self.updated_at = Utc::now();
        Ok(self.current_amount)
    }

    /// Share of the target saved so far; exceeds 1.0 once overshot.
    pub fn progress_ratio(&self) -> f64 {
        if self.target_amount > 0.0 {
            self.current_amount / self.target_amount
        } else {
            0.0
        }
    }

    pub fn is_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    /// Checks the invariants every stored goal must satisfy.
    pub fn validate(&self) -> Result<(), FinanceError> {
        if self.name.trim().is_empty() {
            return Err(FinanceError::Validation("goal name cannot be empty".into()));
        }
        if !(self.target_amount.is_finite() && self.target_amount > 0.0) {
            return Err(FinanceError::InvalidAmount(self.target_amount));
        }
        if !(self.current_amount.is_finite() && self.current_amount >= 0.0) {
            return Err(FinanceError::Validation(
                "current amount cannot be negative".into(),
            ));
        }
        Ok(())
    }

    /// Display ordering: priority, then target date ascending with undated
    /// goals ahead of dated ones, then most recently created.
    pub fn display_cmp(&self, other: &SavingsGoal) -> Ordering {
        self.priority
            .rank()
            .cmp(&other.priority.rank())
            .then_with(|| self.target_date.cmp(&other.target_date))
            .then_with(|| other.created_at.cmp(&self.created_at))
    }
}
