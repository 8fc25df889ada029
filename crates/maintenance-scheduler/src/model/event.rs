//! Maintenance event documents.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::assignee::{deserialize_assignment, Assignee};
use crate::error::{RecurrenceError, ValidationError};
use crate::recurrence::compute_next_date;

/// Opaque identifier assigned by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub address: String,
    pub building_number: String,
    pub office_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Equipment {
    pub filter_size: String,
    pub condition: String,
}

/// Every stored field of an event except its identifier.
///
/// This is both the draft submitted for creation and the body of a stored
/// document. `next_maintenance_date` is derived: use
/// [`EventData::refresh_next_maintenance_date`] after touching
/// `last_maintenance_date` or `maintenance_frequency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub title: String,
    #[serde(deserialize_with = "wire::date")]
    pub date: NaiveDate,
    #[serde(
        default,
        deserialize_with = "wire::optional_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<NaiveTime>,
    #[serde(flatten)]
    pub location: Location,
    #[serde(flatten)]
    pub equipment: Equipment,
    #[serde(
        default,
        deserialize_with = "deserialize_assignment",
        skip_serializing_if = "Option::is_none"
    )]
    pub assign_to: Option<Assignee>,
    #[serde(
        default,
        deserialize_with = "wire::optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_maintenance_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "wire::frequency",
        skip_serializing_if = "Option::is_none"
    )]
    pub maintenance_frequency: Option<u32>,
    #[serde(
        default,
        deserialize_with = "wire::optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub next_maintenance_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub notes: String,
}

impl EventData {
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            date,
            time: None,
            location: Location::default(),
            equipment: Equipment::default(),
            assign_to: None,
            last_maintenance_date: None,
            maintenance_frequency: None,
            next_maintenance_date: None,
            completed: false,
            notes: String::new(),
        }
    }

    pub fn with_recurrence(mut self, last_maintenance_date: NaiveDate, frequency_days: u32) -> Self {
        self.last_maintenance_date = Some(last_maintenance_date);
        self.maintenance_frequency = Some(frequency_days);
        self
    }

    pub fn with_assignee(mut self, assignee: Assignee) -> Self {
        self.assign_to = Some(assignee);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if let Some(0) = self.maintenance_frequency {
            return Err(ValidationError::InvalidFrequency(0));
        }
        Ok(())
    }

    /// Recomputes the derived next date from last date + frequency. Clears it
    /// when either input is missing.
    pub fn refresh_next_maintenance_date(&mut self) -> Result<(), RecurrenceError> {
        self.next_maintenance_date = match (self.last_maintenance_date, self.maintenance_frequency) {
            (Some(last), Some(days)) => Some(compute_next_date(last, i64::from(days))?),
            _ => None,
        };
        Ok(())
    }

    /// Whether creating this event expands into a series.
    pub fn is_recurring(&self) -> bool {
        self.maintenance_frequency.is_some_and(|days| days > 0) && self.next_maintenance_date.is_some()
    }
}

/// A stored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceEvent {
    pub id: EventId,
    #[serde(flatten)]
    pub data: EventData,
}

impl MaintenanceEvent {
    pub fn new(id: EventId, data: EventData) -> Self {
        Self { id, data }
    }

    pub fn is_assigned_to(&self, worker: &Assignee) -> bool {
        self.data
            .assign_to
            .as_ref()
            .is_some_and(|assignee| assignee.matches(worker))
    }
}

/// Lenient readers for documents written by earlier clients, which stored
/// dates as ISO timestamps and numeric fields as form strings.
mod wire {
    use chrono::{NaiveDate, NaiveTime};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    use crate::recurrence::parse_date;

    pub(super) fn date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        parse_date(&text).map_err(D::Error::custom)
    }

    pub(super) fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) if !text.trim().is_empty() => {
                parse_date(&text).map(Some).map_err(D::Error::custom)
            }
            _ => Ok(None),
        }
    }

    pub(super) fn optional_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        NaiveTime::parse_from_str(text, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid time of day: {text}")))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FrequencyRepr {
        Number(i64),
        Text(String),
    }

    /// Non-positive legacy values read as "no recurrence".
    pub(super) fn frequency<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let days = match Option::<FrequencyRepr>::deserialize(deserializer)? {
            None => return Ok(None),
            Some(FrequencyRepr::Number(days)) => days,
            Some(FrequencyRepr::Text(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                text.parse::<i64>().map_err(|_| {
                    D::Error::custom(format!("invalid maintenance frequency: {text}"))
                })?
            }
        };
        Ok(u32::try_from(days).ok().filter(|days| *days > 0))
    }
}
