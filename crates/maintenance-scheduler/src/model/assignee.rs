//! Worker assignment.
//!
//! Older event documents store `assignTo` as a free-text label. Everything
//! read through this module comes out as a structured [`Assignee`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The worker responsible for a maintenance event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Assignee {
    pub first_name: String,
    pub last_name: String,
}

impl Assignee {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Normalizes a legacy free-text label. The first word becomes the first
    /// name and the rest the last name; a blank label means unassigned.
    pub fn from_legacy(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.split_once(char::is_whitespace) {
            Some((first, rest)) => Some(Self::new(first, rest.trim())),
            None => Some(Self::new(trimmed, "")),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn is_blank(&self) -> bool {
        self.first_name.trim().is_empty() && self.last_name.trim().is_empty()
    }

    /// Case-insensitive comparison on trimmed names.
    pub fn matches(&self, other: &Assignee) -> bool {
        eq_name(&self.first_name, &other.first_name) && eq_name(&self.last_name, &other.last_name)
    }
}

impl fmt::Display for Assignee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

fn eq_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AssignmentRepr {
    Legacy(String),
    Structured(Assignee),
}

/// `deserialize_with` helper accepting both wire shapes of `assignTo`.
pub(crate) fn deserialize_assignment<'de, D>(deserializer: D) -> Result<Option<Assignee>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<AssignmentRepr>::deserialize(deserializer)?;
    Ok(match repr {
        None => None,
        Some(AssignmentRepr::Legacy(label)) => Assignee::from_legacy(&label),
        Some(AssignmentRepr::Structured(assignee)) if assignee.is_blank() => None,
        Some(AssignmentRepr::Structured(assignee)) => Some(assignee),
    })
}

/// True when the fields of a raw event document still carry a string
/// `assignTo`.
pub fn is_legacy_assignment(fields: &serde_json::Map<String, serde_json::Value>) -> bool {
    fields
        .get("assignTo")
        .map(serde_json::Value::is_string)
        .unwrap_or(false)
}
