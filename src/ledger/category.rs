use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Categories every new ledger starts with, as `(name, description)`.
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Food", "Food and dining expenses"),
    ("Bills", "Utility bills and recurring payments"),
    ("Entertainment", "Movies, games, and leisure activities"),
    ("Transportation", "Gas, public transport, and travel"),
    ("Shopping", "Clothing, electronics, and general shopping"),
    ("Healthcare", "Medical expenses and health-related costs"),
    ("Salary", "Regular income from employment"),
    ("Other", "Miscellaneous transactions"),
];

/// Shared label for grouping transactions and budgets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Category {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn matches_name(&self, candidate: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(candidate.trim())
    }
}
