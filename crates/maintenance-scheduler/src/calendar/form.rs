use chrono::{NaiveDate, NaiveTime};

use crate::error::ValidationError;
use crate::model::{Assignee, EventChanges, EventData, Equipment, Location, MaintenanceEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Draft,
    Submitted,
    Persisted,
    /// The write failed; the form is editable again.
    Failed(String),
}

/// Editable event fields behind the create and update modals.
///
/// The next maintenance date is read-only and follows the last date and
/// frequency as they are edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventForm {
    data: EventData,
    state: FormState,
    error: Option<ValidationError>,
}

impl EventForm {
    pub fn for_date(date: NaiveDate) -> Self {
        Self::from_data(EventData::new(String::new(), date))
    }

    pub fn from_event(event: &MaintenanceEvent) -> Self {
        Self::from_data(event.data.clone())
    }

    fn from_data(data: EventData) -> Self {
        let mut form = Self {
            data,
            state: FormState::Draft,
            error: None,
        };
        form.refresh_next();
        form
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Inline validation message, if the last edit or submit failed validation.
    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    pub fn is_editable(&self) -> bool {
        matches!(self.state, FormState::Draft | FormState::Failed(_))
    }

    pub fn next_maintenance_date(&self) -> Option<NaiveDate> {
        self.data.next_maintenance_date
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.data.title = title.into();
        if matches!(self.error, Some(ValidationError::EmptyTitle)) && !self.data.title.trim().is_empty() {
            self.error = None;
        }
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.data.date = date;
    }

    pub fn set_time(&mut self, time: Option<NaiveTime>) {
        self.data.time = time;
    }

    pub fn set_location(&mut self, location: Location) {
        self.data.location = location;
    }

    pub fn set_equipment(&mut self, equipment: Equipment) {
        self.data.equipment = equipment;
    }

    pub fn set_assignee(&mut self, assignee: Option<Assignee>) {
        self.data.assign_to = assignee;
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.data.completed = completed;
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.data.notes = notes.into();
    }

    pub fn set_last_maintenance_date(&mut self, date: Option<NaiveDate>) {
        self.data.last_maintenance_date = date;
        self.refresh_next();
    }

    pub fn set_maintenance_frequency(&mut self, days: Option<u32>) {
        self.data.maintenance_frequency = days;
        self.refresh_next();
    }

    fn refresh_next(&mut self) {
        match self.data.refresh_next_maintenance_date() {
            Ok(()) => {
                if matches!(self.error, Some(ValidationError::InvalidFrequency(_))) {
                    self.error = None;
                }
            }
            Err(_) => {
                self.data.next_maintenance_date = None;
                let days = self.data.maintenance_frequency.map(i64::from).unwrap_or(0);
                self.error = Some(ValidationError::InvalidFrequency(days));
            }
        }
    }

    /// Validates and moves to `Submitted`, returning the data to write.
    /// On a validation failure the form stays editable with the error set.
    pub fn begin_submit(&mut self) -> Result<EventData, ValidationError> {
        if let Err(error) = self.data.validate() {
            self.error = Some(error.clone());
            return Err(error);
        }
        self.error = None;
        self.state = FormState::Submitted;
        Ok(self.data.clone())
    }

    /// Changes that overwrite the stored event with this form.
    pub fn changes(&self) -> EventChanges {
        EventChanges::replace_with(&self.data)
    }

    pub fn mark_persisted(&mut self) {
        self.state = FormState::Persisted;
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.state = FormState::Failed(message.into());
    }

    pub(crate) fn show_error(&mut self, error: ValidationError) {
        self.error = Some(error);
        self.state = FormState::Draft;
    }
}
