//! Calendar Presentation Controller and the view-side state it owns.

pub mod controller;
pub mod debounce;
pub mod form;
pub mod notification;
pub mod view;

pub use controller::{CalendarController, Modal, SubmitResult};
pub use debounce::{ClickAction, ClickDebouncer};
pub use form::{EventForm, FormState};
pub use notification::{Notification, NotificationKind, Notifier};
pub use view::{group_events, CalendarView, EventGroups};
