//! Budget CRUD and the monthly budget-versus-spending report.

use uuid::Uuid;

use crate::auth::UserContext;
use crate::ledger::{
    summarize_month, validate_amount, Budget, BudgetMonth, BudgetPeriod, BudgetSummary, Ledger,
};

use super::{CategoryService, ServiceError, ServiceResult};

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub category_id: Uuid,
    pub amount: f64,
    pub month: BudgetMonth,
    pub period: BudgetPeriod,
}

impl NewBudget {
    pub fn monthly(category_id: Uuid, amount: f64, month: BudgetMonth) -> Self {
        Self {
            category_id,
            amount,
            month,
            period: BudgetPeriod::Monthly,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BudgetPatch {
    pub category_id: Option<Uuid>,
    pub amount: Option<f64>,
    pub month: Option<BudgetMonth>,
    pub period: Option<BudgetPeriod>,
}

pub struct BudgetService;

impl BudgetService {
    pub fn create(ledger: &mut Ledger, ctx: &UserContext, draft: NewBudget) -> ServiceResult<Uuid> {
        let amount = validate_amount(draft.amount)?;
        CategoryService::ensure_exists(ledger, draft.category_id)?;
        let budget = Budget::new(ctx.user_id(), draft.category_id, amount, draft.month)
            .with_period(draft.period);
        ensure_unique(ledger, &budget)?;
        Ok(ledger.add_budget(budget))
    }

    pub fn get<'a>(ledger: &'a Ledger, ctx: &UserContext, id: Uuid) -> ServiceResult<&'a Budget> {
        ledger
            .budget(id)
            .filter(|budget| budget.user_id == ctx.user_id())
            .ok_or_else(|| ServiceError::not_found("Budget"))
    }

    /// Lists the user's budgets, newest month first and then by category name.
    pub fn list<'a>(
        ledger: &'a Ledger,
        ctx: &UserContext,
        month: Option<BudgetMonth>,
    ) -> Vec<&'a Budget> {
        let mut budgets: Vec<&Budget> = ledger
            .budgets
            .iter()
            .filter(|budget| budget.user_id == ctx.user_id())
            .filter(|budget| month.map_or(true, |month| budget.month == month))
            .collect();
        let name_of = |budget: &Budget| {
            ledger
                .category(budget.category_id)
                .map(|category| category.name.clone())
                .unwrap_or_default()
        };
        budgets.sort_by(|a, b| {
            b.month
                .cmp(&a.month)
                .then_with(|| name_of(a).cmp(&name_of(b)))
        });
        budgets
    }

    pub fn update(
        ledger: &mut Ledger,
        ctx: &UserContext,
        id: Uuid,
        patch: BudgetPatch,
    ) -> ServiceResult<()> {
        let mut updated = Self::get(ledger, ctx, id)?.clone();
        if let Some(amount) = patch.amount {
            updated.amount = validate_amount(amount)?;
        }
        if let Some(category_id) = patch.category_id {
            CategoryService::ensure_exists(ledger, category_id)?;
            updated.category_id = category_id;
        }
        if let Some(month) = patch.month {
            updated.month = month;
        }
        if let Some(period) = patch.period {
            updated.period = period;
        }
        ensure_unique(ledger, &updated)?;

        updated.updated_at = chrono::Utc::now();
        let slot = ledger
            .budget_mut(id)
            .ok_or_else(|| ServiceError::not_found("Budget"))?;
        *slot = updated;
        ledger.touch();
        Ok(())
    }

    pub fn delete(ledger: &mut Ledger, ctx: &UserContext, id: Uuid) -> ServiceResult<Budget> {
        let index = ledger
            .budgets
            .iter()
            .position(|budget| budget.id == id && budget.user_id == ctx.user_id())
            .ok_or_else(|| ServiceError::not_found("Budget"))?;
        let removed = ledger.budgets.remove(index);
        ledger.touch();
        Ok(removed)
    }

    /// Budgeted versus spent for every monthly budget the user holds in `month`.
    pub fn summary(ledger: &Ledger, ctx: &UserContext, month: BudgetMonth) -> Vec<BudgetSummary> {
        summarize_month(
            ctx.user_id(),
            month,
            &ledger.budgets,
            |category_id| ledger.category(category_id).map(|c| c.name.clone()),
            ledger,
        )
    }
}

/// Rejects a budget whose key collides with another stored budget.
fn ensure_unique(ledger: &Ledger, candidate: &Budget) -> ServiceResult<()> {
    let key = candidate.key();
    let clash = ledger
        .budgets
        .iter()
        .any(|existing| existing.id != candidate.id && existing.key() == key);
    if clash {
        return Err(ServiceError::Conflict(format!(
            "A {} budget for this category in {} already exists",
            candidate.period, candidate.month
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TEST_HASHER;
    use crate::core::services::{NewTransaction, TransactionService, UserService};
    use crate::ledger::TransactionKind;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup() -> (Ledger, UserContext) {
        let mut ledger = Ledger::with_default_categories("Budgets");
        let ctx = UserService::signup(
            &mut ledger,
            &TEST_HASHER,
            "kim",
            "kim@example.com",
            "password",
        )
        .unwrap();
        (ledger, ctx)
    }

    #[test]
    fn duplicate_budget_conflicts() {
        let (mut ledger, ctx) = setup();
        let food = ledger.category_by_name("Food").unwrap().id;
        let month = BudgetMonth::new(2024, 3).unwrap();
        BudgetService::create(&mut ledger, &ctx, NewBudget::monthly(food, 300.0, month)).unwrap();
        let err = BudgetService::create(&mut ledger, &ctx, NewBudget::monthly(food, 150.0, month))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "A monthly budget for this category in 2024-03 already exists"
        );

        let weekly = NewBudget {
            period: BudgetPeriod::Weekly,
            ..NewBudget::monthly(food, 80.0, month)
        };
        assert!(BudgetService::create(&mut ledger, &ctx, weekly).is_ok());
    }

    #[test]
    fn create_requires_known_category_and_positive_amount() {
        let (mut ledger, ctx) = setup();
        let month = BudgetMonth::new(2024, 3).unwrap();
        let unknown = NewBudget::monthly(Uuid::new_v4(), 10.0, month);
        assert!(matches!(
            BudgetService::create(&mut ledger, &ctx, unknown),
            Err(ServiceError::NotFound(_))
        ));
        let food = ledger.category_by_name("Food").unwrap().id;
        let negative = NewBudget::monthly(food, -5.0, month);
        assert!(BudgetService::create(&mut ledger, &ctx, negative).is_err());
        assert!(ledger.budgets.is_empty());
    }

    #[test]
    fn update_rejects_collision_but_allows_self() {
        let (mut ledger, ctx) = setup();
        let food = ledger.category_by_name("Food").unwrap().id;
        let bills = ledger.category_by_name("Bills").unwrap().id;
        let month = BudgetMonth::new(2024, 3).unwrap();
        let first = BudgetService::create(&mut ledger, &ctx, NewBudget::monthly(food, 100.0, month))
            .unwrap();
        BudgetService::create(&mut ledger, &ctx, NewBudget::monthly(bills, 200.0, month)).unwrap();

        let same_key = BudgetPatch {
            amount: Some(120.0),
            ..BudgetPatch::default()
        };
        BudgetService::update(&mut ledger, &ctx, first, same_key).unwrap();
        assert_eq!(BudgetService::get(&ledger, &ctx, first).unwrap().amount, 120.0);

        let collide = BudgetPatch {
            category_id: Some(bills),
            ..BudgetPatch::default()
        };
        assert!(matches!(
            BudgetService::update(&mut ledger, &ctx, first, collide),
            Err(ServiceError::Conflict(_))
        ));
        assert_eq!(BudgetService::get(&ledger, &ctx, first).unwrap().category_id, food);
    }

    #[test]
    fn list_orders_by_month_then_category() {
        let (mut ledger, ctx) = setup();
        let food = ledger.category_by_name("Food").unwrap().id;
        let bills = ledger.category_by_name("Bills").unwrap().id;
        let march = BudgetMonth::new(2024, 3).unwrap();
        let april = BudgetMonth::new(2024, 4).unwrap();
        for (category, month) in [(food, march), (bills, march), (food, april)] {
            BudgetService::create(&mut ledger, &ctx, NewBudget::monthly(category, 50.0, month))
                .unwrap();
        }
        let order: Vec<(BudgetMonth, Uuid)> = BudgetService::list(&ledger, &ctx, None)
            .into_iter()
            .map(|b| (b.month, b.category_id))
            .collect();
        assert_eq!(order, vec![(april, food), (march, bills), (march, food)]);
        assert_eq!(BudgetService::list(&ledger, &ctx, Some(april)).len(), 1);
    }

    #[test]
    fn summary_counts_only_month_expenses() {
        let (mut ledger, ctx) = setup();
        let food = ledger.category_by_name("Food").unwrap().id;
        let month = BudgetMonth::new(2024, 3).unwrap();
        BudgetService::create(&mut ledger, &ctx, NewBudget::monthly(food, 500.0, month)).unwrap();
        let today = date(2024, 3, 31);
        let spending = [
            (120.0, date(2024, 3, 5)),
            (80.0, date(2024, 3, 31)),
            (40.0, date(2024, 4, 1)),
        ];
        for (amount, day) in spending {
            TransactionService::create(
                &mut ledger,
                &ctx,
                NewTransaction::new(TransactionKind::Expense, amount).category(food).on(day),
                today,
            )
            .unwrap();
        }
        TransactionService::create(
            &mut ledger,
            &ctx,
            NewTransaction::new(TransactionKind::Income, 999.0).category(food).on(date(2024, 3, 6)),
            today,
        )
        .unwrap();

        let rows = BudgetService::summary(&ledger, &ctx, month);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category_name, "Food");
        assert_eq!(rows[0].spent_amount, 200.0);
        assert_eq!(rows[0].remaining_amount, 300.0);
    }
}
