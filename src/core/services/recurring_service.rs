//! Recurring transaction templates: creation, edits with re-projection, and
//! materialization of due occurrences.

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::UserContext;
use crate::ledger::{
    validate_amount, Frequency, Interval, Ledger, RecurrenceSchedule, RecurringTransaction,
    TransactionKind,
};

use super::{required_text, CategoryService, ServiceError, ServiceResult};

/// Upper bound on transactions produced by one [`RecurringService::materialize_due`] call.
pub const MAX_MATERIALIZED_PER_RUN: usize = 1024;

#[derive(Debug, Clone)]
pub struct NewRecurring {
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Option<Uuid>,
    pub frequency: Frequency,
    /// Raw interval as received; must be a positive integer.
    pub interval: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct RecurringPatch {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub kind: Option<TransactionKind>,
    pub category_id: Option<Option<Uuid>>,
    pub frequency: Option<Frequency>,
    pub interval: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub is_active: Option<bool>,
}

impl RecurringPatch {
    fn touches_schedule(&self) -> bool {
        self.frequency.is_some()
            || self.interval.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
    }
}

pub struct RecurringService;

impl RecurringService {
    /// Validates the template and stores it with its first due date projected
    /// against `reference`.
    pub fn create(
        ledger: &mut Ledger,
        ctx: &UserContext,
        draft: NewRecurring,
        reference: NaiveDate,
    ) -> ServiceResult<Uuid> {
        let description = required_text(&draft.description, "Description")?;
        let amount = validate_amount(draft.amount)?;
        if let Some(category_id) = draft.category_id {
            CategoryService::ensure_exists(ledger, category_id)?;
        }
        let interval = Interval::new(draft.interval)?;
        check_end_after_start(draft.start_date, draft.end_date)?;

        let schedule = RecurrenceSchedule::new(
            draft.start_date,
            draft.frequency,
            interval,
            draft.end_date,
            reference,
        )?;
        if !schedule.is_active {
            return Err(ServiceError::Invalid(
                "Schedule has no valid future occurrences".into(),
            ));
        }

        let mut recurring =
            RecurringTransaction::new(ctx.user_id(), description, amount, draft.kind, schedule);
        recurring.category_id = draft.category_id;
        info!(
            recurring_id = %recurring.id,
            period = %recurring.schedule.period().label(),
            next_due = %recurring.next_due_date(),
            "created recurring transaction"
        );
        Ok(ledger.add_recurring(recurring))
    }

    pub fn get<'a>(
        ledger: &'a Ledger,
        ctx: &UserContext,
        id: Uuid,
    ) -> ServiceResult<&'a RecurringTransaction> {
        ledger
            .recurring(id)
            .filter(|rt| rt.user_id == ctx.user_id())
            .ok_or_else(|| ServiceError::not_found("Recurring transaction"))
    }

    /// Ordered by next due date.
    pub fn list<'a>(
        ledger: &'a Ledger,
        ctx: &UserContext,
        active_only: bool,
    ) -> Vec<&'a RecurringTransaction> {
        let mut items: Vec<&RecurringTransaction> = ledger
            .recurring
            .iter()
            .filter(|rt| rt.user_id == ctx.user_id())
            .filter(|rt| !active_only || rt.is_active())
            .collect();
        items.sort_by_key(|rt| rt.next_due_date());
        items
    }

    /// Applies `patch`, re-projecting the schedule when any schedule field
    /// changed or when a stopped schedule is asked to resume. An explicit
    /// deactivation always wins; a resume request whose projection has no
    /// future occurrence leaves the schedule inactive.
    pub fn update(
        ledger: &mut Ledger,
        ctx: &UserContext,
        id: Uuid,
        patch: RecurringPatch,
        reference: NaiveDate,
    ) -> ServiceResult<RecurringTransaction> {
        let mut updated = Self::get(ledger, ctx, id)?.clone();

        if let Some(description) = &patch.description {
            updated.description = required_text(description, "Description")?;
        }
        if let Some(amount) = patch.amount {
            updated.amount = validate_amount(amount)?;
        }
        if let Some(kind) = patch.kind {
            updated.kind = kind;
        }
        if let Some(category_id) = patch.category_id {
            if let Some(category_id) = category_id {
                CategoryService::ensure_exists(ledger, category_id)?;
            }
            updated.category_id = category_id;
        }

        let schedule = &mut updated.schedule;
        if let Some(frequency) = patch.frequency {
            schedule.frequency = frequency;
        }
        if let Some(interval) = patch.interval {
            schedule.interval = Interval::new(interval)?;
        }
        if let Some(start_date) = patch.start_date {
            schedule.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            schedule.end_date = end_date;
        }
        check_end_after_start(schedule.start_date, schedule.end_date)?;

        let was_active = schedule.is_active;
        match patch.is_active {
            Some(false) => {
                if patch.touches_schedule() {
                    schedule.reproject(reference)?;
                }
                schedule.is_active = false;
            }
            Some(true) if patch.touches_schedule() || !was_active => {
                let projection = schedule.reproject(reference)?;
                if !projection.is_active {
                    warn!(
                        recurring_id = %id,
                        "activation rejected: schedule has no future occurrence"
                    );
                }
            }
            _ => {
                if patch.touches_schedule() {
                    schedule.reproject(reference)?;
                }
            }
        }

        updated.touch();
        let slot = ledger
            .recurring_mut(id)
            .ok_or_else(|| ServiceError::not_found("Recurring transaction"))?;
        *slot = updated.clone();
        ledger.touch();
        Ok(updated)
    }

    /// Soft delete: the template stays in the ledger but never fires again.
    pub fn deactivate(ledger: &mut Ledger, ctx: &UserContext, id: Uuid) -> ServiceResult<()> {
        Self::get(ledger, ctx, id)?;
        let recurring = ledger
            .recurring_mut(id)
            .ok_or_else(|| ServiceError::not_found("Recurring transaction"))?;
        recurring.schedule.is_active = false;
        recurring.touch();
        ledger.touch();
        Ok(())
    }

    /// Turns every occurrence of the user's active schedules dated on or
    /// before `reference` into a ledger transaction. Returns the new ids.
    /// Either every template advances and all transactions are recorded, or
    /// the ledger is left unchanged.
    pub fn materialize_due(
        ledger: &mut Ledger,
        ctx: &UserContext,
        reference: NaiveDate,
    ) -> ServiceResult<Vec<Uuid>> {
        let mut advanced = Vec::new();
        let mut produced = Vec::new();
        for (index, recurring) in ledger
            .recurring
            .iter()
            .enumerate()
            .filter(|(_, rt)| rt.user_id == ctx.user_id())
        {
            let budget = MAX_MATERIALIZED_PER_RUN - produced.len();
            if budget == 0 {
                warn!(%reference, "materialization cap reached; remaining occurrences stay due");
                break;
            }
            let mut draft = recurring.clone();
            let created = draft.materialize_until(reference, budget)?;
            if !created.is_empty() {
                produced.extend(created);
                advanced.push((index, draft));
            }
        }

        let ids: Vec<Uuid> = produced.iter().map(|txn| txn.id).collect();
        if !produced.is_empty() {
            for (index, draft) in advanced {
                ledger.recurring[index] = draft;
            }
            ledger.transactions.extend(produced);
            ledger.touch();
            info!(count = ids.len(), %reference, "materialized recurring transactions");
        }
        Ok(ids)
    }
}

fn check_end_after_start(start: NaiveDate, end: Option<NaiveDate>) -> ServiceResult<()> {
    match end {
        Some(end) if end < start => Err(ServiceError::Invalid(format!(
            "End date {} cannot be before start date {}",
            end, start
        ))),
        _ => Ok(()),
    }
}
