//! Event Store Adapter: the `events` and `users` collections on top of a
//! document storage backend.

pub mod events;
pub mod migration;
pub mod subscription;
pub mod users;

pub use events::{DocumentEventStore, EventStore, SharedEventStore, EVENTS_COLLECTION};
pub use migration::{migrate_legacy_assignments, MigrationReport};
pub use subscription::{ObserverRegistry, Scope, SnapshotObserver, Subscription};
pub use users::{UserDirectory, USERS_COLLECTION};
