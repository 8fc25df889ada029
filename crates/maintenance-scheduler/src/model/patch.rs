//! Partial updates to stored events.

use chrono::{NaiveDate, NaiveTime};

use super::assignee::Assignee;
use super::event::{EventData, Equipment, Location};

/// User-editable changes to an event. `None` leaves a field untouched; for
/// optional fields `Some(None)` clears it.
///
/// The next maintenance date is not editable here; the lifecycle manager
/// derives it and writes it through [`EventPatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<Option<NaiveTime>>,
    pub location: Option<Location>,
    pub equipment: Option<Equipment>,
    pub assign_to: Option<Option<Assignee>>,
    pub last_maintenance_date: Option<Option<NaiveDate>>,
    pub maintenance_frequency: Option<Option<u32>>,
    pub completed: Option<bool>,
    pub notes: Option<String>,
}

impl EventChanges {
    /// Changes that overwrite every editable field with `data`.
    pub fn replace_with(data: &EventData) -> Self {
        Self {
            title: Some(data.title.clone()),
            date: Some(data.date),
            time: Some(data.time),
            location: Some(data.location.clone()),
            equipment: Some(data.equipment.clone()),
            assign_to: Some(data.assign_to.clone()),
            last_maintenance_date: Some(data.last_maintenance_date),
            maintenance_frequency: Some(data.maintenance_frequency),
            completed: Some(data.completed),
            notes: Some(data.notes.clone()),
        }
    }

    pub fn apply_to(&self, data: &mut EventData) {
        if let Some(title) = &self.title {
            data.title = title.clone();
        }
        if let Some(date) = self.date {
            data.date = date;
        }
        if let Some(time) = self.time {
            data.time = time;
        }
        if let Some(location) = &self.location {
            data.location = location.clone();
        }
        if let Some(equipment) = &self.equipment {
            data.equipment = equipment.clone();
        }
        if let Some(assign_to) = &self.assign_to {
            data.assign_to = assign_to.clone();
        }
        if let Some(last) = self.last_maintenance_date {
            data.last_maintenance_date = last;
        }
        if let Some(frequency) = self.maintenance_frequency {
            data.maintenance_frequency = frequency;
        }
        if let Some(completed) = self.completed {
            data.completed = completed;
        }
        if let Some(notes) = &self.notes {
            data.notes = notes.clone();
        }
    }
}

/// What the store writes: user changes plus the derived next date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub changes: EventChanges,
    pub next_maintenance_date: Option<Option<NaiveDate>>,
}

impl EventPatch {
    pub fn date_only(date: NaiveDate) -> Self {
        Self {
            changes: EventChanges {
                date: Some(date),
                ..EventChanges::default()
            },
            next_maintenance_date: None,
        }
    }

    pub fn apply_to(&self, data: &mut EventData) {
        self.changes.apply_to(data);
        if let Some(next) = self.next_maintenance_date {
            data.next_maintenance_date = next;
        }
    }
}

impl From<EventChanges> for EventPatch {
    fn from(changes: EventChanges) -> Self {
        Self {
            changes,
            next_maintenance_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn untouched_fields_survive() {
        let mut data = EventData::new("Boiler check", ymd(2024, 5, 1));
        data.notes = "keep me".to_string();
        let changes = EventChanges {
            title: Some("Boiler service".to_string()),
            ..EventChanges::default()
        };
        changes.apply_to(&mut data);
        assert_eq!(data.title, "Boiler service");
        assert_eq!(data.notes, "keep me");
    }

    #[test]
    fn some_none_clears_optional_fields() {
        let mut data = EventData::new("x", ymd(2024, 5, 1))
            .with_assignee(Assignee::new("Jo", "Smith"))
            .with_recurrence(ymd(2024, 5, 1), 30);
        let changes = EventChanges {
            assign_to: Some(None),
            maintenance_frequency: Some(None),
            ..EventChanges::default()
        };
        changes.apply_to(&mut data);
        assert!(data.assign_to.is_none());
        assert!(data.maintenance_frequency.is_none());
        assert_eq!(data.last_maintenance_date, Some(ymd(2024, 5, 1)));
    }

    #[test]
    fn date_only_patch_leaves_chain_alone() {
        let mut data = EventData::new("x", ymd(2024, 5, 1)).with_recurrence(ymd(2024, 5, 1), 30);
        data.refresh_next_maintenance_date().unwrap();
        EventPatch::date_only(ymd(2024, 5, 9)).apply_to(&mut data);
        assert_eq!(data.date, ymd(2024, 5, 9));
        assert_eq!(data.last_maintenance_date, Some(ymd(2024, 5, 1)));
        assert_eq!(data.next_maintenance_date, Some(ymd(2024, 5, 31)));
    }

    #[test]
    fn replace_with_round_trips_every_field() {
        let mut source = EventData::new("Full", ymd(2024, 7, 4)).with_recurrence(ymd(2024, 7, 1), 14);
        source.completed = true;
        source.notes = "n".to_string();
        let mut target = EventData::new("Other", ymd(2023, 1, 1));
        EventChanges::replace_with(&source).apply_to(&mut target);
        target.next_maintenance_date = source.next_maintenance_date;
        assert_eq!(target, source);
    }
}
