//! Data model: events, assignees, users, and partial updates.

pub mod assignee;
pub mod event;
pub mod patch;
pub mod user;

pub use assignee::{is_legacy_assignment, Assignee};
pub use event::{Equipment, EventData, EventId, Location, MaintenanceEvent};
pub use patch::{EventChanges, EventPatch};
pub use user::{Caller, Role, UserProfile};
