mod common;

use common::{date, ledger_with_user, signup, temp_manager, HASHER};
use finance_tracker::{
    auth::UserContext,
    core::services::{
        BudgetService, NewBudget, NewRecurring, NewSavingsGoal, NewTransaction, RecurringPatch,
        RecurringService, SavingsGoalService, ServiceError, ServiceResult, SummaryService,
        TransactionFilter, TransactionService, UserPatch, UserService,
    },
    ledger::{BudgetMonth, Frequency, TransactionKind},
};

#[test]
fn budget_summary_reports_spent_and_remaining() {
    let (mut ledger, ctx) = ledger_with_user("ana");
    let groceries = ledger.category_by_name("Food").unwrap().id;
    let month = BudgetMonth::new(2024, 2).unwrap();
    BudgetService::create(&mut ledger, &ctx, NewBudget::monthly(groceries, 500.0, month)).unwrap();

    for (amount, day) in [(120.0, date(2024, 2, 1)), (80.0, date(2024, 2, 29))] {
        TransactionService::create(
            &mut ledger,
            &ctx,
            NewTransaction::new(TransactionKind::Expense, amount)
                .category(groceries)
                .on(day),
            date(2024, 3, 1),
        )
        .unwrap();
    }

    let rows = BudgetService::summary(&ledger, &ctx, month);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].budgeted_amount, 500.0);
    assert_eq!(rows[0].spent_amount, 200.0);
    assert_eq!(rows[0].remaining_amount, 300.0);
}

#[test]
fn budget_without_spending_reports_zero() {
    let (mut ledger, ctx) = ledger_with_user("ana");
    let bills = ledger.category_by_name("Bills").unwrap().id;
    let month = BudgetMonth::new(2024, 7).unwrap();
    BudgetService::create(&mut ledger, &ctx, NewBudget::monthly(bills, 250.0, month)).unwrap();
    let rows = BudgetService::summary(&ledger, &ctx, month);
    assert_eq!(rows[0].spent_amount, 0.0);
    assert_eq!(rows[0].remaining_amount, 250.0);
}

#[test]
fn two_contributions_add_exactly_one_hundred() {
    let (mut ledger, ctx) = ledger_with_user("ana");
    let goal = SavingsGoalService::create(&mut ledger, &ctx, NewSavingsGoal::new("Laptop", 80.0))
        .unwrap();
    let before = SavingsGoalService::get(&ledger, &ctx, goal).unwrap().current_amount;
    SavingsGoalService::contribute(&mut ledger, &ctx, goal, 50.0).unwrap();
    let after = SavingsGoalService::contribute(&mut ledger, &ctx, goal, 50.0).unwrap();
    assert_eq!(after - before, 100.0);
    let stored = SavingsGoalService::get(&ledger, &ctx, goal).unwrap();
    assert!(stored.progress_ratio() > 1.0);
}

#[test]
fn users_only_see_their_own_records() {
    let (mut ledger, ana) = ledger_with_user("ana");
    let bo = signup(&mut ledger, "bo");
    let today = date(2024, 1, 10);

    let txn = TransactionService::create(
        &mut ledger,
        &ana,
        NewTransaction::new(TransactionKind::Income, 1000.0),
        today,
    )
    .unwrap();
    let goal = SavingsGoalService::create(&mut ledger, &ana, NewSavingsGoal::new("Car", 5000.0))
        .unwrap();

    assert!(TransactionService::list(&ledger, &bo, &TransactionFilter::default()).is_empty());
    assert!(matches!(
        TransactionService::get(&ledger, &bo, txn),
        Err(ServiceError::NotFound(_))
    ));
    assert!(SavingsGoalService::contribute(&mut ledger, &bo, goal, 10.0).is_err());
    assert_eq!(SummaryService::dashboard(&ledger, &bo).balance, 0.0);
    assert_eq!(SummaryService::dashboard(&ledger, &ana).balance, 1000.0);
    assert_eq!(UserService::profile(&ledger, &ana).unwrap().balance, 1000.0);
}

#[test]
fn session_without_known_user_is_rejected() {
    let (ledger, ana) = ledger_with_user("ana");
    assert!(matches!(
        UserContext::authenticate(&ledger, None),
        Err(ServiceError::Unauthorized)
    ));
    let ctx = UserContext::authenticate(&ledger, Some(ana.user_id())).unwrap();
    let again = UserService::login(&ledger, &HASHER, "ana", "correct-horse").unwrap();
    assert_eq!(ctx, again);
}

fn salary(start: chrono::NaiveDate) -> NewRecurring {
    NewRecurring {
        description: "Salary".into(),
        amount: 3000.0,
        kind: TransactionKind::Income,
        category_id: None,
        frequency: Frequency::Monthly,
        interval: 1,
        start_date: start,
        end_date: None,
    }
}

#[test]
fn recurring_lifecycle_through_ledger_manager() {
    let (mut manager, _guard) = temp_manager("household");
    let ctx = manager
        .transact(|ledger| -> ServiceResult<UserContext> { Ok(signup(ledger, "ana")) })
        .unwrap();

    let id = manager
        .transact(|ledger| {
            RecurringService::create(ledger, &ctx, salary(date(2024, 1, 25)), date(2024, 1, 1))
        })
        .unwrap();

    let created = manager
        .transact(|ledger| RecurringService::materialize_due(ledger, &ctx, date(2024, 3, 31)))
        .unwrap();
    assert_eq!(created.len(), 3);
    assert_eq!(
        RecurringService::get(manager.ledger(), &ctx, id)
            .unwrap()
            .next_due_date(),
        date(2024, 4, 25)
    );

    let paused = manager
        .transact(|ledger| {
            RecurringService::update(
                ledger,
                &ctx,
                id,
                RecurringPatch {
                    is_active: Some(false),
                    ..RecurringPatch::default()
                },
                date(2024, 4, 1),
            )
        })
        .unwrap();
    assert!(!paused.is_active());
    let none = manager
        .transact(|ledger| RecurringService::materialize_due(ledger, &ctx, date(2024, 9, 30)))
        .unwrap();
    assert!(none.is_empty());

    let resumed = manager
        .transact(|ledger| {
            RecurringService::update(
                ledger,
                &ctx,
                id,
                RecurringPatch {
                    is_active: Some(true),
                    ..RecurringPatch::default()
                },
                date(2024, 10, 1),
            )
        })
        .unwrap();
    assert!(resumed.is_active());
    assert_eq!(resumed.next_due_date(), date(2024, 10, 25));
    assert_eq!(manager.ledger().transaction_count(), 3);
}

#[test]
fn rejected_recurring_edit_is_not_persisted() {
    let (mut manager, temp) = temp_manager("household");
    let ctx = manager
        .transact(|ledger| -> ServiceResult<UserContext> { Ok(signup(ledger, "ana")) })
        .unwrap();
    let id = manager
        .transact(|ledger| {
            RecurringService::create(ledger, &ctx, salary(date(2024, 1, 25)), date(2024, 1, 1))
        })
        .unwrap();

    let result = manager.transact(|ledger| {
        RecurringService::update(
            ledger,
            &ctx,
            id,
            RecurringPatch {
                amount: Some(3500.0),
                end_date: Some(Some(date(2023, 12, 31))),
                ..RecurringPatch::default()
            },
            date(2024, 1, 1),
        )
    });
    assert!(result.is_err());
    assert_eq!(
        RecurringService::get(manager.ledger(), &ctx, id).unwrap().amount,
        3000.0
    );

    drop(manager);
    let storage = finance_tracker::storage::JsonStorage::new(Some(temp.path().to_path_buf()), None)
        .unwrap();
    let reopened =
        finance_tracker::core::LedgerManager::open(Box::new(storage), "household").unwrap();
    assert_eq!(reopened.ledger().recurring[0].amount, 3000.0);
}

#[test]
fn profile_rename_is_persisted_and_clash_is_rolled_back() {
    let (mut manager, _guard) = temp_manager("household");
    let ana = manager
        .transact(|ledger| -> ServiceResult<_> { Ok(signup(ledger, "ana")) })
        .unwrap();
    manager
        .transact(|ledger| -> ServiceResult<_> { Ok(signup(ledger, "bo")) })
        .unwrap();

    let renamed = manager
        .transact(|ledger| {
            let patch = UserPatch {
                username: Some("  ana-maria ".into()),
                email: Some("Ana.Maria@Example.com".into()),
            };
            UserService::update_profile(ledger, &ana, patch)
        })
        .unwrap();
    assert_eq!(renamed.username, "ana-maria");
    assert_eq!(renamed.email, "ana.maria@example.com");

    let clash: ServiceResult<_> = manager.transact(|ledger| {
        let patch = UserPatch {
            email: Some("bo@example.com".into()),
            ..UserPatch::default()
        };
        UserService::update_profile(ledger, &ana, patch)
    });
    assert!(matches!(clash, Err(ServiceError::Conflict(_))));
    let profile = UserService::profile(manager.ledger(), &ana).unwrap();
    assert_eq!(profile.email, "ana.maria@example.com");
    assert_eq!(
        UserService::login(manager.ledger(), &HASHER, "ana-maria", "correct-horse").unwrap(),
        ana
    );
}
