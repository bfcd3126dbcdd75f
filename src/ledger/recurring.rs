use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::schedule::{advance_once, Frequency, Interval, Period};
use super::transaction::{Transaction, TransactionKind};
use crate::errors::ScheduleError;

/// Outcome of walking a schedule forward to a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleProjection {
    /// Earliest occurrence on or after the reference date. When the projection
    /// is inactive this is the last cursor position and must not be materialized.
    pub next_due_date: NaiveDate,
    pub is_active: bool,
    pub advances: u32,
}

/// Finds the earliest occurrence on or after `reference`, walking from `start_date`.
///
/// The walk stops as soon as the cursor passes `end_date`; in that case the
/// projection is inactive. Every step must move strictly forward, otherwise
/// the walk aborts with [`ScheduleError::Inconsistency`] instead of looping.
pub fn project_schedule(
    start_date: NaiveDate,
    frequency: Frequency,
    interval: Interval,
    end_date: Option<NaiveDate>,
    reference: NaiveDate,
) -> Result<ScheduleProjection, ScheduleError> {
    let past_end = |date: NaiveDate| end_date.map_or(false, |end| date > end);
    let mut cursor = start_date;
    let mut advances = 0u32;
    let mut exhausted = false;

    while cursor < reference {
        if past_end(cursor) {
            exhausted = true;
            break;
        }
        cursor = advance_once(cursor, frequency, interval)?;
        advances += 1;
        if past_end(cursor) {
            exhausted = true;
            break;
        }
    }

    let is_active = !exhausted && cursor >= reference && !past_end(cursor);
    debug!(
        %start_date,
        %frequency,
        interval = interval.get(),
        end_date = ?end_date,
        %reference,
        next_due = %cursor,
        is_active,
        advances,
        "projected schedule"
    );
    Ok(ScheduleProjection {
        next_due_date: cursor,
        is_active,
        advances,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceSchedule {
    pub start_date: NaiveDate,
    pub frequency: Frequency,
    pub interval: Interval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub is_active: bool,
}

impl RecurrenceSchedule {
    /// Builds a schedule already projected against `reference`.
    pub fn new(
        start_date: NaiveDate,
        frequency: Frequency,
        interval: Interval,
        end_date: Option<NaiveDate>,
        reference: NaiveDate,
    ) -> Result<Self, ScheduleError> {
        let projection = project_schedule(start_date, frequency, interval, end_date, reference)?;
        Ok(Self {
            start_date,
            frequency,
            interval,
            end_date,
            next_due_date: projection.next_due_date,
            is_active: projection.is_active,
        })
    }

    pub fn period(&self) -> Period {
        Period::new(self.frequency, self.interval)
    }

    pub fn project(&self, reference: NaiveDate) -> Result<ScheduleProjection, ScheduleError> {
        project_schedule(
            self.start_date,
            self.frequency,
            self.interval,
            self.end_date,
            reference,
        )
    }

    /// Re-runs the projection and stores its result.
    pub fn reproject(&mut self, reference: NaiveDate) -> Result<ScheduleProjection, ScheduleError> {
        let projection = self.project(reference)?;
        self.next_due_date = projection.next_due_date;
        self.is_active = projection.is_active;
        Ok(projection)
    }

    pub fn is_due(&self, reference: NaiveDate) -> bool {
        self.is_active && self.next_due_date <= reference
    }

    /// Consumes the current due date and moves to the following occurrence,
    /// deactivating the schedule once it runs past `end_date`.
    pub fn roll_forward(&mut self) -> Result<NaiveDate, ScheduleError> {
        let due = self.next_due_date;
        let next = advance_once(due, self.frequency, self.interval)?;
        self.next_due_date = next;
        if self.end_date.map_or(false, |end| next > end) {
            self.is_active = false;
        }
        Ok(due)
    }
}

/// A template that produces ledger transactions on a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    pub schedule: RecurrenceSchedule,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringTransaction {
    pub fn new(
        user_id: Uuid,
        description: impl Into<String>,
        amount: f64,
        kind: TransactionKind,
        schedule: RecurrenceSchedule,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            description: description.into(),
            amount,
            kind,
            category_id: None,
            schedule,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn is_active(&self) -> bool {
        self.schedule.is_active
    }

    pub fn next_due_date(&self) -> NaiveDate {
        self.schedule.next_due_date
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Builds a ledger transaction for every occurrence due on or before
    /// `reference`, advancing the schedule past each one. At most `limit`
    /// transactions are produced; remaining occurrences stay due. On error
    /// the schedule is left where it was.
    pub fn materialize_until(
        &mut self,
        reference: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Transaction>, ScheduleError> {
        let mut schedule = self.schedule.clone();
        let mut created = Vec::new();
        while created.len() < limit && schedule.is_due(reference) {
            let due = schedule.roll_forward()?;
            let mut txn = Transaction::new(self.user_id, self.kind, self.amount, due)
                .with_description(self.description.clone());
            txn.category_id = self.category_id;
            txn.recurring_id = Some(self.id);
            created.push(txn);
        }
        if !created.is_empty() {
            self.schedule = schedule;
            self.touch();
        }
        Ok(created)
    }
}
