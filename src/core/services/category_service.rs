use uuid::Uuid;

use crate::ledger::{Category, Ledger, DEFAULT_CATEGORIES};

use super::{ServiceError, ServiceResult};

pub struct CategoryService;

impl CategoryService {
    /// Returns every category ordered by name.
    pub fn list(ledger: &Ledger) -> Vec<&Category> {
        let mut categories: Vec<&Category> = ledger.categories.iter().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    /// Adds any default category missing from the ledger, returning how many were added.
    pub fn seed_defaults(ledger: &mut Ledger) -> usize {
        let mut added = 0;
        for (name, description) in DEFAULT_CATEGORIES {
            if ledger.category_by_name(name).is_none() {
                ledger.add_category(Category::new(*name, *description));
                added += 1;
            }
        }
        added
    }

    pub fn ensure_exists(ledger: &Ledger, id: Uuid) -> ServiceResult<&Category> {
        ledger
            .category(id)
            .ok_or_else(|| ServiceError::not_found("Category"))
    }
}
