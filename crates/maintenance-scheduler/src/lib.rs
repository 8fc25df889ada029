//! Recurring maintenance-event scheduling for an HVAC service calendar.
//!
//! Layers, leaf to root: [`recurrence`] date arithmetic, [`storage`]
//! document backends, the [`store`] adapter over the `events` and `users`
//! collections, the [`lifecycle`] manager, and the [`calendar`] controller.

pub mod calendar;
pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod recurrence;
pub mod storage;
pub mod store;

pub use calendar::{CalendarController, ClickAction, EventForm, Modal, SubmitResult};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{load_or_create_config, open_storage, SchedulerConfig, StorageKind};
pub use error::{
    ConfigError, RecurrenceError, SchedulerError, SchedulerResult, StoreError, StoreResult,
    ValidationError,
};
pub use lifecycle::{CreateOutcome, EventManager, SeriesFailure};
pub use model::{Assignee, Caller, EventChanges, EventData, EventId, MaintenanceEvent, Role, UserProfile};
pub use recurrence::{compute_next_date, default_horizon, parse_date, parse_date_in, project_series};
pub use storage::{SharedStorage, Storage};
pub use store::{DocumentEventStore, EventStore, SharedEventStore, Subscription, UserDirectory};
