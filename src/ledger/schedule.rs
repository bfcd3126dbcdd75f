//! Calendar period arithmetic used by recurring schedules.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::errors::ScheduleError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    fn unit_label(&self) -> &'static str {
        match self {
            Frequency::Daily => "Day",
            Frequency::Weekly => "Week",
            Frequency::Monthly => "Month",
            Frequency::Yearly => "Year",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ScheduleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(ScheduleError::InvalidFrequency(value.to_string())),
        }
    }
}

/// Number of frequency units between two occurrences. Always at least one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i64", into = "i64")]
pub struct Interval(u32);

impl Interval {
    pub const ONE: Interval = Interval(1);

    pub fn new(value: i64) -> Result<Self, ScheduleError> {
        match u32::try_from(value) {
            Ok(every) if every >= 1 => Ok(Interval(every)),
            _ => Err(ScheduleError::InvalidInterval(value)),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Interval {
    type Error = ScheduleError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Interval::new(value)
    }
}

impl From<Interval> for i64 {
    fn from(interval: Interval) -> Self {
        i64::from(interval.0)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A frequency paired with its interval, e.g. "every 2 weeks".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Period {
    pub frequency: Frequency,
    pub interval: Interval,
}

impl Period {
    pub fn new(frequency: Frequency, interval: Interval) -> Self {
        Self {
            frequency,
            interval,
        }
    }

    pub fn next_date(&self, from: NaiveDate) -> Result<NaiveDate, ScheduleError> {
        advance_once(from, self.frequency, self.interval)
    }

    pub fn label(&self) -> String {
        match (self.interval.get(), self.frequency) {
            (1, Frequency::Daily) => "Daily".into(),
            (1, Frequency::Weekly) => "Weekly".into(),
            (1, Frequency::Monthly) => "Monthly".into(),
            (1, Frequency::Yearly) => "Yearly".into(),
            (n, frequency) => format!("Every {} {}s", n, frequency.unit_label()),
        }
    }
}

/// Returns the date exactly one period after `base`.
///
/// Monthly and yearly steps keep the day of month, clamping to the last day of
/// shorter target months (Jan 31 + 1 month = Feb 28/29, Feb 29 + 1 year = Feb 28).
/// A result that does not land strictly after `base` (including calendar
/// overflow) is reported as [`ScheduleError::Inconsistency`].
pub fn advance_once(
    base: NaiveDate,
    frequency: Frequency,
    interval: Interval,
) -> Result<NaiveDate, ScheduleError> {
    let every = u64::from(interval.get());
    let next = match frequency {
        Frequency::Daily => base.checked_add_days(Days::new(every)),
        Frequency::Weekly => base.checked_add_days(Days::new(every * 7)),
        Frequency::Monthly => add_months(base, every as i64),
        Frequency::Yearly => add_months(base, every as i64 * 12),
    };
    match next {
        Some(next) if next > base => Ok(next),
        other => {
            error!(
                %base,
                next = ?other,
                %frequency,
                interval = interval.get(),
                "period arithmetic did not advance"
            );
            Err(ScheduleError::Inconsistency { base })
        }
    }
}

/// Number of days in the given month, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    first_next.pred_opt().map(|last| last.day())
}

fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let index = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}
