//! Recurrence arithmetic and series projection.
//!
//! All arithmetic is on calendar dates. The only time zone involved is the
//! one legacy timestamps are read in.

use chrono::{DateTime, Days, Local, Months, NaiveDate, TimeZone};

use crate::error::RecurrenceError;
use crate::model::EventData;

pub const DEFAULT_HORIZON_MONTHS: u32 = 12;

/// `last_date + frequency_days` calendar days.
pub fn compute_next_date(last_date: NaiveDate, frequency_days: i64) -> Result<NaiveDate, RecurrenceError> {
    if frequency_days <= 0 {
        return Err(RecurrenceError::InvalidFrequency(frequency_days));
    }
    last_date
        .checked_add_days(Days::new(frequency_days as u64))
        .ok_or(RecurrenceError::OutOfRange)
}

/// Parses `YYYY-MM-DD`, or an RFC 3339 timestamp reduced to its local date.
///
/// Legacy documents store the creator's local midnight as a UTC timestamp,
/// so the date must be taken in local time, not in the timestamp's offset.
pub fn parse_date(text: &str) -> Result<NaiveDate, RecurrenceError> {
    parse_date_in(text, &Local)
}

/// [`parse_date`] with timestamps reduced to a date in `zone`.
pub fn parse_date_in<Tz: TimeZone>(text: &str, zone: &Tz) -> Result<NaiveDate, RecurrenceError> {
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.with_timezone(zone).date_naive())
        .map_err(|_| RecurrenceError::InvalidDate(trimmed.to_string()))
}

pub fn default_horizon(today: NaiveDate) -> NaiveDate {
    horizon_after(today, DEFAULT_HORIZON_MONTHS)
}

pub fn horizon_after(today: NaiveDate, months: u32) -> NaiveDate {
    today
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// Lazily generated series drafts. Cloning restarts from the clone point.
#[derive(Debug, Clone)]
pub struct SeriesProjection {
    template: EventData,
    current: Option<NaiveDate>,
    frequency_days: i64,
    horizon: NaiveDate,
}

impl SeriesProjection {
    pub fn horizon(&self) -> NaiveDate {
        self.horizon
    }
}

impl Iterator for SeriesProjection {
    type Item = EventData;

    fn next(&mut self) -> Option<EventData> {
        let current = self.current.filter(|date| *date <= self.horizon)?;
        let next = compute_next_date(current, self.frequency_days).ok();

        let mut draft = self.template.clone();
        draft.date = current;
        draft.last_maintenance_date = Some(current);
        draft.next_maintenance_date = next;

        self.current = next;
        Some(draft)
    }
}

/// Projects the series that follows `base`: one draft per occurrence starting
/// at `base.next_maintenance_date`, up to and including `horizon`.
///
/// Empty when the base has no frequency or no next date.
pub fn project_series(base: &EventData, horizon: NaiveDate) -> SeriesProjection {
    let frequency_days = base.maintenance_frequency.map(i64::from).unwrap_or(0);
    let current = if frequency_days > 0 {
        base.next_maintenance_date
    } else {
        None
    };
    SeriesProjection {
        template: base.clone(),
        current,
        frequency_days,
        horizon,
    }
}
