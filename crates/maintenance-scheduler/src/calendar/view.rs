use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::model::{EventId, MaintenanceEvent};

/// Events bucketed by calendar date, rebuilt from each store snapshot.
#[derive(Debug, Clone, Default)]
pub struct CalendarView {
    by_date: BTreeMap<NaiveDate, Vec<MaintenanceEvent>>,
}

impl CalendarView {
    pub fn from_events(events: &[MaintenanceEvent]) -> Self {
        let mut view = Self::default();
        view.replace(events);
        view
    }

    /// Replaces the contents with `events`, keeping their order within a day.
    pub fn replace(&mut self, events: &[MaintenanceEvent]) {
        self.by_date.clear();
        for event in events {
            self.by_date
                .entry(event.data.date)
                .or_default()
                .push(event.clone());
        }
    }

    pub fn events_on(&self, date: NaiveDate) -> &[MaintenanceEvent] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Days of the given month that have at least one event.
    pub fn month(&self, year: i32, month: u32) -> BTreeMap<NaiveDate, Vec<MaintenanceEvent>> {
        self.by_date
            .iter()
            .filter(|(date, _)| date.year() == year && date.month() == month)
            .map(|(date, events)| (*date, events.clone()))
            .collect()
    }

    pub fn find(&self, id: &EventId) -> Option<&MaintenanceEvent> {
        self.by_date.values().flatten().find(|event| &event.id == id)
    }

    pub fn len(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

/// A user's events split for the personal list.
///
/// Incomplete events past their date stay in `upcoming`; use
/// [`EventGroups::overdue`] to highlight them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventGroups {
    pub upcoming: Vec<MaintenanceEvent>,
    pub completed: Vec<MaintenanceEvent>,
}

impl EventGroups {
    pub fn overdue(&self, today: NaiveDate) -> impl Iterator<Item = &MaintenanceEvent> {
        self.upcoming
            .iter()
            .filter(move |event| event.data.date < today)
    }
}

pub fn group_events(events: &[MaintenanceEvent]) -> EventGroups {
    let (mut completed, mut upcoming): (Vec<_>, Vec<_>) =
        events.iter().cloned().partition(|event| event.data.completed);
    let by_schedule = |a: &MaintenanceEvent, b: &MaintenanceEvent| {
        (a.data.date, a.data.time).cmp(&(b.data.date, b.data.time))
    };
    upcoming.sort_by(by_schedule);
    completed.sort_by(by_schedule);
    EventGroups {
        upcoming,
        completed,
    }
}
