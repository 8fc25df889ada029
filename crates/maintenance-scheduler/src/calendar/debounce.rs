//! Single/double click disambiguation on calendar days.
//!
//! The debouncer owns no timer. Callers pass the current instant into
//! [`ClickDebouncer::click`] and [`ClickDebouncer::poll`], and may sleep
//! until [`ClickDebouncer::pending_deadline`].

use chrono::NaiveDate;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// A single click settled: show that day's events.
    ViewDay(NaiveDate),
    /// A second click arrived in time: open the create form on its date.
    CreateOnDay(NaiveDate),
}

#[derive(Debug, Clone, Copy)]
struct PendingClick {
    date: NaiveDate,
    deadline: Instant,
}

#[derive(Debug, Clone)]
pub struct ClickDebouncer {
    delay: Duration,
    pending: Option<PendingClick>,
}

impl ClickDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Registers a click. A click inside the window of a pending one resolves
    /// to [`ClickAction::CreateOnDay`] for the new date. A pending click whose
    /// window already passed resolves to [`ClickAction::ViewDay`] and the new
    /// click starts a fresh window.
    pub fn click(&mut self, date: NaiveDate, now: Instant) -> Option<ClickAction> {
        let fresh = PendingClick {
            date,
            deadline: now + self.delay,
        };
        match self.pending.take() {
            Some(pending) if now < pending.deadline => Some(ClickAction::CreateOnDay(date)),
            Some(expired) => {
                self.pending = Some(fresh);
                Some(ClickAction::ViewDay(expired.date))
            }
            None => {
                self.pending = Some(fresh);
                None
            }
        }
    }

    /// Fires the pending single click once its window has passed.
    pub fn poll(&mut self, now: Instant) -> Option<ClickAction> {
        match self.pending {
            Some(pending) if now >= pending.deadline => {
                self.pending = None;
                Some(ClickAction::ViewDay(pending.date))
            }
            _ => None,
        }
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.map(|pending| pending.deadline)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl Default for ClickDebouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_click_fires_after_delay() {
        let start = Instant::now();
        let mut debouncer = ClickDebouncer::default();
        assert_eq!(debouncer.click(ymd(2024, 5, 1), start), None);
        assert_eq!(debouncer.pending_deadline(), Some(start + Duration::from_millis(300)));

        assert_eq!(debouncer.poll(start + Duration::from_millis(299)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(300)),
            Some(ClickAction::ViewDay(ymd(2024, 5, 1)))
        );
        assert_eq!(debouncer.poll(start + Duration::from_millis(900)), None);
        assert_eq!(debouncer.pending_deadline(), None);
    }

    #[test]
    fn double_click_uses_second_date_and_cancels_single() {
        let start = Instant::now();
        let mut debouncer = ClickDebouncer::default();
        debouncer.click(ymd(2024, 5, 1), start);
        assert_eq!(
            debouncer.click(ymd(2024, 5, 2), start + Duration::from_millis(120)),
            Some(ClickAction::CreateOnDay(ymd(2024, 5, 2)))
        );
        assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn late_second_click_settles_first_and_starts_over() {
        let start = Instant::now();
        let mut debouncer = ClickDebouncer::new(Duration::from_millis(250));
        debouncer.click(ymd(2024, 5, 1), start);
        let later = start + Duration::from_millis(400);
        assert_eq!(
            debouncer.click(ymd(2024, 5, 3), later),
            Some(ClickAction::ViewDay(ymd(2024, 5, 1)))
        );
        assert_eq!(
            debouncer.poll(later + Duration::from_millis(250)),
            Some(ClickAction::ViewDay(ymd(2024, 5, 3)))
        );
    }

    #[test]
    fn cancel_drops_pending_click() {
        let start = Instant::now();
        let mut debouncer = ClickDebouncer::default();
        debouncer.click(ymd(2024, 5, 1), start);
        debouncer.cancel();
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }
}
