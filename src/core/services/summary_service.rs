use std::collections::BTreeMap;

use serde::Serialize;

use crate::auth::UserContext;
use crate::ledger::{Ledger, Transaction, TransactionKind};

const RECENT_TRANSACTIONS: usize = 10;
const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpending {
    pub category: String,
    pub amount: f64,
}

/// Headline figures for a user's landing page.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub balance: f64,
    pub total_income: f64,
    pub total_expense: f64,
    pub recent_transactions: Vec<Transaction>,
    pub category_spending: Vec<CategorySpending>,
}

pub struct SummaryService;

impl SummaryService {
    pub fn dashboard(ledger: &Ledger, ctx: &UserContext) -> Dashboard {
        let user_id = ctx.user_id();

        let mut recent: Vec<&Transaction> = ledger.transactions_for(user_id).collect();
        recent.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let mut spending: BTreeMap<String, f64> = BTreeMap::new();
        for txn in ledger.transactions_for(user_id).filter(|txn| txn.is_expense()) {
            let name = txn
                .category_id
                .and_then(|id| ledger.category(id))
                .map(|category| category.name.clone())
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            *spending.entry(name).or_insert(0.0) += txn.amount;
        }

        Dashboard {
            balance: ledger.balance_for(user_id),
            total_income: ledger.total_for(user_id, TransactionKind::Income),
            total_expense: ledger.total_for(user_id, TransactionKind::Expense),
            recent_transactions: recent
                .into_iter()
                .take(RECENT_TRANSACTIONS)
                .cloned()
                .collect(),
            category_spending: spending
                .into_iter()
                .map(|(category, amount)| CategorySpending { category, amount })
                .collect(),
        }
    }
}
