//! Business logic helpers for managing transactions.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::auth::UserContext;
use crate::ledger::{validate_amount, Ledger, Transaction, TransactionKind};

use super::{CategoryService, ServiceError, ServiceResult};

/// Number of transactions returned by [`TransactionService::list`] when no limit is given.
pub const DEFAULT_LIST_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: f64,
    pub kind: TransactionKind,
    pub description: String,
    pub category_id: Option<Uuid>,
    /// Defaults to the reference date passed to `create`.
    pub date: Option<NaiveDate>,
}

impl NewTransaction {
    pub fn new(kind: TransactionKind, amount: f64) -> Self {
        Self {
            amount,
            kind,
            description: String::new(),
            category_id: None,
            date: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub kind: Option<TransactionKind>,
    /// `Some(None)` clears the category.
    pub category_id: Option<Option<Uuid>>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub category_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<usize>,
}

impl TransactionFilter {
    fn matches(&self, txn: &Transaction) -> bool {
        self.category_id.map_or(true, |id| txn.category_id == Some(id))
            && self.kind.map_or(true, |kind| txn.kind == kind)
            && self.start_date.map_or(true, |start| txn.date >= start)
            && self.end_date.map_or(true, |end| txn.date <= end)
    }
}

/// Provides validated CRUD helpers for ledger transactions.
pub struct TransactionService;

impl TransactionService {
    /// Adds a new transaction and returns its identifier.
    pub fn create(
        ledger: &mut Ledger,
        ctx: &UserContext,
        draft: NewTransaction,
        today: NaiveDate,
    ) -> ServiceResult<Uuid> {
        let amount = validate_amount(draft.amount)?;
        if let Some(category_id) = draft.category_id {
            CategoryService::ensure_exists(ledger, category_id)?;
        }
        let date = draft.date.unwrap_or(today);
        let mut txn = Transaction::new(ctx.user_id(), draft.kind, amount, date)
            .with_description(draft.description.trim());
        txn.category_id = draft.category_id;
        Ok(ledger.add_transaction(txn))
    }

    pub fn get<'a>(
        ledger: &'a Ledger,
        ctx: &UserContext,
        id: Uuid,
    ) -> ServiceResult<&'a Transaction> {
        ledger
            .transaction(id)
            .filter(|txn| txn.user_id == ctx.user_id())
            .ok_or_else(|| ServiceError::not_found("Transaction"))
    }

    /// Applies `patch` after validating every supplied field.
    pub fn update(
        ledger: &mut Ledger,
        ctx: &UserContext,
        id: Uuid,
        patch: TransactionPatch,
    ) -> ServiceResult<()> {
        Self::get(ledger, ctx, id)?;
        let amount = patch.amount.map(validate_amount).transpose()?;
        if let Some(Some(category_id)) = patch.category_id {
            CategoryService::ensure_exists(ledger, category_id)?;
        }

        let txn = ledger
            .transaction_mut(id)
            .ok_or_else(|| ServiceError::not_found("Transaction"))?;
        if let Some(amount) = amount {
            txn.amount = amount;
        }
        if let Some(description) = patch.description {
            txn.description = description.trim().to_string();
        }
        if let Some(kind) = patch.kind {
            txn.kind = kind;
        }
        if let Some(category_id) = patch.category_id {
            txn.category_id = category_id;
        }
        if let Some(date) = patch.date {
            txn.date = date;
        }
        ledger.touch();
        Ok(())
    }

    /// Removes the transaction identified by `id`, returning the removed instance.
    pub fn delete(ledger: &mut Ledger, ctx: &UserContext, id: Uuid) -> ServiceResult<Transaction> {
        let index = ledger
            .transactions
            .iter()
            .position(|txn| txn.id == id && txn.user_id == ctx.user_id())
            .ok_or_else(|| ServiceError::not_found("Transaction"))?;
        let removed = ledger.transactions.remove(index);
        ledger.touch();
        Ok(removed)
    }

    /// Newest first (by date, then creation time), capped at the filter's limit.
    pub fn list<'a>(
        ledger: &'a Ledger,
        ctx: &UserContext,
        filter: &TransactionFilter,
    ) -> Vec<&'a Transaction> {
        let mut matches: Vec<&Transaction> = ledger
            .transactions_for(ctx.user_id())
            .filter(|txn| filter.matches(txn))
            .collect();
        matches.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        matches.truncate(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT));
        matches
    }
}
