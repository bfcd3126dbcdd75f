use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    budget::{Budget, ExpenseLookup},
    category::{Category, DEFAULT_CATEGORIES},
    recurring::RecurringTransaction,
    savings_goal::SavingsGoal,
    transaction::{Transaction, TransactionKind},
    user::User,
};
use crate::errors::FinanceError;

pub(crate) const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FinanceError> {
        if end < start {
            return Err(FinanceError::Validation(format!(
                "window end {} precedes start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Aggregate holding every record of one finance tracker instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub recurring: Vec<RecurringTransaction>,
    #[serde(default)]
    pub savings_goals: Vec<SavingsGoal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Ledger::schema_version_default")]
    pub schema_version: u8,
}

impl Ledger {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            users: Vec::new(),
            categories: Vec::new(),
            transactions: Vec::new(),
            budgets: Vec::new(),
            recurring: Vec::new(),
            savings_goals: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    /// Creates a ledger seeded with the default category set.
    pub fn with_default_categories(name: impl Into<String>) -> Self {
        let mut ledger = Self::new(name);
        for (name, description) in DEFAULT_CATEGORIES {
            ledger.add_category(Category::new(*name, *description));
        }
        ledger
    }

    pub fn add_user(&mut self, user: User) -> Uuid {
        let id = user.id;
        self.users.push(user);
        self.touch();
        id
    }

    pub fn add_category(&mut self, category: Category) -> Uuid {
        let id = category.id;
        self.categories.push(category);
        self.touch();
        id
    }

    pub fn add_transaction(&mut self, transaction: Transaction) -> Uuid {
        let id = transaction.id;
        self.transactions.push(transaction);
        self.touch();
        id
    }

    pub fn add_budget(&mut self, budget: Budget) -> Uuid {
        let id = budget.id;
        self.budgets.push(budget);
        self.touch();
        id
    }

    pub fn add_recurring(&mut self, recurring: RecurringTransaction) -> Uuid {
        let id = recurring.id;
        self.recurring.push(recurring);
        self.touch();
        id
    }

    pub fn add_savings_goal(&mut self, goal: SavingsGoal) -> Uuid {
        let id = goal.id;
        self.savings_goals.push(goal);
        self.touch();
        id
    }

    pub fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|user| user.id == id)
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|category| category.matches_name(name))
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn transaction_mut(&mut self, id: Uuid) -> Option<&mut Transaction> {
        self.transactions.iter_mut().find(|txn| txn.id == id)
    }

    pub fn budget(&self, id: Uuid) -> Option<&Budget> {
        self.budgets.iter().find(|budget| budget.id == id)
    }

    pub fn budget_mut(&mut self, id: Uuid) -> Option<&mut Budget> {
        self.budgets.iter_mut().find(|budget| budget.id == id)
    }

    pub fn recurring(&self, id: Uuid) -> Option<&RecurringTransaction> {
        self.recurring.iter().find(|rt| rt.id == id)
    }

    pub fn recurring_mut(&mut self, id: Uuid) -> Option<&mut RecurringTransaction> {
        self.recurring.iter_mut().find(|rt| rt.id == id)
    }

    pub fn savings_goal(&self, id: Uuid) -> Option<&SavingsGoal> {
        self.savings_goals.iter().find(|goal| goal.id == id)
    }

    pub fn savings_goal_mut(&mut self, id: Uuid) -> Option<&mut SavingsGoal> {
        self.savings_goals.iter_mut().find(|goal| goal.id == id)
    }

    pub fn transactions_for(&self, user_id: Uuid) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |txn| txn.user_id == user_id)
    }

    pub fn total_for(&self, user_id: Uuid, kind: TransactionKind) -> f64 {
        self.transactions_for(user_id)
            .filter(|txn| txn.kind == kind)
            .map(|txn| txn.amount)
            .sum()
    }

    /// Income minus expenses across all of the user's transactions.
    pub fn balance_for(&self, user_id: Uuid) -> f64 {
        self.transactions_for(user_id)
            .map(Transaction::signed_amount)
            .sum()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}

impl ExpenseLookup for Ledger {
    fn sum_expenses(&self, user_id: Uuid, category_id: Uuid, window: DateWindow) -> f64 {
        self.transactions_for(user_id)
            .filter(|txn| {
                txn.is_expense()
                    && txn.category_id == Some(category_id)
                    && window.contains(txn.date)
            })
            .map(|txn| txn.amount)
            .sum()
    }
}
