use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::auth::UserContext;
use crate::ledger::{GoalPriority, Ledger, SavingsGoal};

use super::{required_text, ServiceError, ServiceResult};

#[derive(Debug, Clone)]
pub struct NewSavingsGoal {
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub target_date: Option<NaiveDate>,
    pub description: String,
    pub priority: GoalPriority,
}

impl NewSavingsGoal {
    pub fn new(name: impl Into<String>, target_amount: f64) -> Self {
        Self {
            name: name.into(),
            target_amount,
            current_amount: 0.0,
            target_date: None,
            description: String::new(),
            priority: GoalPriority::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SavingsGoalPatch {
    pub name: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub target_date: Option<Option<NaiveDate>>,
    pub description: Option<String>,
    pub priority: Option<GoalPriority>,
}

pub struct SavingsGoalService;

impl SavingsGoalService {
    pub fn create(
        ledger: &mut Ledger,
        ctx: &UserContext,
        draft: NewSavingsGoal,
    ) -> ServiceResult<Uuid> {
        let name = required_text(&draft.name, "Goal name")?;
        let mut goal = SavingsGoal::new(ctx.user_id(), name, draft.target_amount);
        goal.current_amount = draft.current_amount;
        goal.target_date = draft.target_date;
        goal.description = draft.description.trim().to_string();
        goal.priority = draft.priority;
        goal.validate()?;
        if goal.current_amount > goal.target_amount {
            return Err(ServiceError::Invalid(
                "Current amount cannot exceed the target amount".into(),
            ));
        }
        Ok(ledger.add_savings_goal(goal))
    }

    pub fn get<'a>(
        ledger: &'a Ledger,
        ctx: &UserContext,
        id: Uuid,
    ) -> ServiceResult<&'a SavingsGoal> {
        ledger
            .savings_goal(id)
            .filter(|goal| goal.user_id == ctx.user_id())
            .ok_or_else(|| ServiceError::not_found("Savings goal"))
    }

    /// Goals in display order: priority, soonest target date, newest.
    pub fn list<'a>(ledger: &'a Ledger, ctx: &UserContext) -> Vec<&'a SavingsGoal> {
        let mut goals: Vec<&SavingsGoal> = ledger
            .savings_goals
            .iter()
            .filter(|goal| goal.user_id == ctx.user_id())
            .collect();
        goals.sort_by(|a, b| a.display_cmp(b));
        goals
    }

    pub fn update(
        ledger: &mut Ledger,
        ctx: &UserContext,
        id: Uuid,
        patch: SavingsGoalPatch,
    ) -> ServiceResult<()> {
        let mut updated = Self::get(ledger, ctx, id)?.clone();
        if let Some(name) = patch.name {
            updated.name = required_text(&name, "Goal name")?;
        }
        if let Some(target) = patch.target_amount {
            updated.target_amount = target;
        }
        if let Some(current) = patch.current_amount {
            updated.current_amount = current;
        }
        if let Some(target_date) = patch.target_date {
            updated.target_date = target_date;
        }
        if let Some(description) = patch.description {
            updated.description = description.trim().to_string();
        }
        if let Some(priority) = patch.priority {
            updated.priority = priority;
        }
        updated.validate()?;

        updated.updated_at = Utc::now();
        let slot = ledger
            .savings_goal_mut(id)
            .ok_or_else(|| ServiceError::not_found("Savings goal"))?;
        *slot = updated;
        ledger.touch();
        Ok(())
    }

    pub fn delete(ledger: &mut Ledger, ctx: &UserContext, id: Uuid) -> ServiceResult<SavingsGoal> {
        let index = ledger
            .savings_goals
            .iter()
            .position(|goal| goal.id == id && goal.user_id == ctx.user_id())
            .ok_or_else(|| ServiceError::not_found("Savings goal"))?;
        let removed = ledger.savings_goals.remove(index);
        ledger.touch();
        Ok(removed)
    }

    /// Adds `amount` to the goal and returns the new saved total.
    pub fn contribute(
        ledger: &mut Ledger,
        ctx: &UserContext,
        id: Uuid,
        amount: f64,
    ) -> ServiceResult<f64> {
        Self::get(ledger, ctx, id)?;
        let goal = ledger
            .savings_goal_mut(id)
            .ok_or_else(|| ServiceError::not_found("Savings goal"))?;
        let total = goal.contribute(amount)?;
        if goal.is_reached() {
            info!(goal_id = %id, total, target = goal.target_amount, "savings goal reached");
        }
        ledger.touch();
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TEST_HASHER;
    use crate::core::services::UserService;
    use crate::errors::FinanceError;

    fn setup() -> (Ledger, UserContext) {
        let mut ledger = Ledger::new("Goals");
        let ctx = UserService::signup(
            &mut ledger,
            &TEST_HASHER,
            "max",
            "max@example.com",
            "password",
        )
        .unwrap();
        (ledger, ctx)
    }

    #[test]
    fn contributions_add_exactly() {
        let (mut ledger, ctx) = setup();
        let id = SavingsGoalService::create(&mut ledger, &ctx, NewSavingsGoal::new("Bike", 300.0))
            .unwrap();
        SavingsGoalService::contribute(&mut ledger, &ctx, id, 50.0).unwrap();
        let total = SavingsGoalService::contribute(&mut ledger, &ctx, id, 50.0).unwrap();
        assert_eq!(total, 100.0);

        let err = SavingsGoalService::contribute(&mut ledger, &ctx, id, -1.0).unwrap_err();
        assert!(matches!(err, ServiceError::Core(FinanceError::InvalidAmount(_))));
        assert_eq!(SavingsGoalService::get(&ledger, &ctx, id).unwrap().current_amount, 100.0);
    }

    #[test]
    fn create_rejects_invalid_amounts() {
        let (mut ledger, ctx) = setup();
        assert!(
            SavingsGoalService::create(&mut ledger, &ctx, NewSavingsGoal::new("Car", 0.0)).is_err()
        );
        let overfunded = NewSavingsGoal {
            current_amount: 500.0,
            ..NewSavingsGoal::new("Car", 100.0)
        };
        assert!(SavingsGoalService::create(&mut ledger, &ctx, overfunded).is_err());
        assert!(
            SavingsGoalService::create(&mut ledger, &ctx, NewSavingsGoal::new("   ", 10.0)).is_err()
        );
        assert!(ledger.savings_goals.is_empty());
    }

    #[test]
    fn update_validates_before_applying() {
        let (mut ledger, ctx) = setup();
        let id = SavingsGoalService::create(&mut ledger, &ctx, NewSavingsGoal::new("Trip", 1000.0))
            .unwrap();
        let bad = SavingsGoalPatch {
            name: Some("Holiday".into()),
            current_amount: Some(-10.0),
            ..SavingsGoalPatch::default()
        };
        assert!(SavingsGoalService::update(&mut ledger, &ctx, id, bad).is_err());
        assert_eq!(SavingsGoalService::get(&ledger, &ctx, id).unwrap().name, "Trip");

        let good = SavingsGoalPatch {
            target_amount: Some(1200.0),
            priority: Some(GoalPriority::High),
            ..SavingsGoalPatch::default()
        };
        SavingsGoalService::update(&mut ledger, &ctx, id, good).unwrap();
        let goal = SavingsGoalService::get(&ledger, &ctx, id).unwrap();
        assert_eq!(goal.target_amount, 1200.0);
        assert_eq!(goal.priority, GoalPriority::High);
    }

    #[test]
    fn list_uses_display_order_and_delete_removes() {
        let (mut ledger, ctx) = setup();
        let low = SavingsGoalService::create(
            &mut ledger,
            &ctx,
            NewSavingsGoal {
                priority: GoalPriority::Low,
                ..NewSavingsGoal::new("Someday", 50.0)
            },
        )
        .unwrap();
        let high = SavingsGoalService::create(
            &mut ledger,
            &ctx,
            NewSavingsGoal {
                priority: GoalPriority::High,
                ..NewSavingsGoal::new("Rent deposit", 2000.0)
            },
        )
        .unwrap();
        let order: Vec<Uuid> = SavingsGoalService::list(&ledger, &ctx)
            .into_iter()
            .map(|goal| goal.id)
            .collect();
        assert_eq!(order, vec![high, low]);

        SavingsGoalService::delete(&mut ledger, &ctx, low).unwrap();
        assert!(matches!(
            SavingsGoalService::get(&ledger, &ctx, low),
            Err(ServiceError::NotFound(_))
        ));
    }
}
