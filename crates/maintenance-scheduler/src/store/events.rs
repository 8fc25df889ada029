use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::migration::{migrate_legacy_assignments, MigrationReport};
use super::subscription::{ObserverRegistry, Scope, SnapshotObserver, Subscription};
use crate::error::{StoreError, StoreResult};
use crate::model::{Assignee, EventData, EventId, EventPatch, MaintenanceEvent};
use crate::storage::SharedStorage;

pub const EVENTS_COLLECTION: &str = "events";

/// CRUD and live snapshots over the `events` collection.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Every event, for calendar-wide views. Delivers the current snapshot
    /// immediately, then a fresh one after each change.
    async fn subscribe_all(&self, observer: SnapshotObserver) -> StoreResult<Subscription>;

    /// Only events assigned to `worker`.
    async fn subscribe_assigned_to(
        &self,
        worker: &Assignee,
        observer: SnapshotObserver,
    ) -> StoreResult<Subscription>;

    async fn create(&self, draft: &EventData) -> StoreResult<MaintenanceEvent>;
    async fn get(&self, id: &EventId) -> StoreResult<MaintenanceEvent>;
    async fn update(&self, id: &EventId, patch: &EventPatch) -> StoreResult<()>;
    async fn delete(&self, id: &EventId) -> StoreResult<()>;
}

pub type SharedEventStore = Arc<dyn EventStore>;

fn not_found(id: &EventId) -> StoreError {
    StoreError::NotFound(format!("{EVENTS_COLLECTION}/{id}"))
}

fn display_order(a: &MaintenanceEvent, b: &MaintenanceEvent) -> Ordering {
    (a.data.date, a.data.time, &a.id).cmp(&(b.data.date, b.data.time, &b.id))
}

/// A committed write, applied to the cached snapshot.
enum Change {
    Upsert(MaintenanceEvent),
    Remove(EventId),
    Reload,
}

/// Applies `change` in place. Returns false when the snapshot must be
/// reloaded from storage instead.
fn apply_change(events: &mut Vec<MaintenanceEvent>, change: Change) -> bool {
    match change {
        Change::Upsert(event) => {
            events.retain(|existing| existing.id != event.id);
            let at = events.partition_point(|existing| display_order(existing, &event) == Ordering::Less);
            events.insert(at, event);
            true
        }
        Change::Remove(id) => {
            events.retain(|existing| existing.id != id);
            true
        }
        Change::Reload => false,
    }
}

type CachedSnapshot = Option<Vec<MaintenanceEvent>>;

/// [`EventStore`] over a document [`Storage`](crate::storage::Storage) backend.
///
/// Assumes it is the only writer to the collection: after the first load,
/// snapshots come from an in-memory copy kept in step with each write.
pub struct DocumentEventStore {
    storage: SharedStorage,
    observers: ObserverRegistry,
    // held across each write and its publication so observers see changes in order
    cache: Mutex<CachedSnapshot>,
}

impl DocumentEventStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            storage,
            observers: ObserverRegistry::new(),
            cache: Mutex::new(None),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    /// Current contents of the collection in display order, read from
    /// storage. Documents that fail to parse are skipped with a warning.
    pub async fn snapshot(&self) -> StoreResult<Vec<MaintenanceEvent>> {
        let ids = self.storage.list(&[EVENTS_COLLECTION]).await?;
        let mut events = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(document) = self.storage.read(&[EVENTS_COLLECTION, &id]).await? else {
                continue;
            };
            match serde_json::from_value::<EventData>(document) {
                Ok(data) => events.push(MaintenanceEvent::new(EventId::from(id), data)),
                Err(error) => {
                    tracing::warn!("skipping unreadable event document {id}: {error}");
                }
            }
        }
        events.sort_by(display_order);
        Ok(events)
    }

    pub async fn migrate_legacy_assignments(&self) -> StoreResult<MigrationReport> {
        let mut cache = self.cache.lock().await;
        let report = migrate_legacy_assignments(self.storage.as_ref()).await?;
        if report.rewritten > 0 {
            self.publish(&mut cache, Change::Reload).await;
        }
        Ok(report)
    }

    async fn write_document(&self, id: &EventId, data: &EventData) -> StoreResult<()> {
        let value =
            serde_json::to_value(data).map_err(|error| StoreError::Serialization(error.to_string()))?;
        self.storage
            .write(&[EVENTS_COLLECTION, id.as_str()], &value)
            .await
    }

    async fn read_document(&self, id: &EventId) -> StoreResult<EventData> {
        let document = self
            .storage
            .read(&[EVENTS_COLLECTION, id.as_str()])
            .await?
            .ok_or_else(|| not_found(id))?;
        serde_json::from_value(document)
            .map_err(|error| StoreError::Serialization(format!("{EVENTS_COLLECTION}/{id}: {error}")))
    }

    /// The write has already committed, so a failed reload only loses this
    /// round of notifications.
    async fn publish(&self, cache: &mut CachedSnapshot, change: Change) {
        let applied = match cache.as_mut() {
            Some(events) => apply_change(events, change),
            None => false,
        };
        if !applied {
            match self.snapshot().await {
                Ok(events) => *cache = Some(events),
                Err(error) => {
                    *cache = None;
                    tracing::warn!("failed to reload event snapshot: {error}");
                    return;
                }
            }
        }
        if let Some(events) = cache.as_deref() {
            self.observers.notify(events);
        }
    }

    async fn register(&self, scope: Scope, observer: SnapshotObserver) -> StoreResult<Subscription> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.snapshot().await?);
        }
        let events = cache.as_deref().unwrap_or_default();
        Ok(self.observers.register(scope, observer, events))
    }
}

#[async_trait]
impl EventStore for DocumentEventStore {
    async fn subscribe_all(&self, observer: SnapshotObserver) -> StoreResult<Subscription> {
        self.register(Scope::All, observer).await
    }

    async fn subscribe_assigned_to(
        &self,
        worker: &Assignee,
        observer: SnapshotObserver,
    ) -> StoreResult<Subscription> {
        self.register(Scope::AssignedTo(worker.clone()), observer).await
    }

    async fn create(&self, draft: &EventData) -> StoreResult<MaintenanceEvent> {
        let mut cache = self.cache.lock().await;
        let event = MaintenanceEvent::new(EventId::generate(), draft.clone());
        self.write_document(&event.id, draft).await?;
        self.publish(&mut cache, Change::Upsert(event.clone())).await;
        Ok(event)
    }

    async fn get(&self, id: &EventId) -> StoreResult<MaintenanceEvent> {
        let data = self.read_document(id).await?;
        Ok(MaintenanceEvent::new(id.clone(), data))
    }

    async fn update(&self, id: &EventId, patch: &EventPatch) -> StoreResult<()> {
        let mut cache = self.cache.lock().await;
        let mut data = self.read_document(id).await?;
        patch.apply_to(&mut data);
        self.write_document(id, &data).await?;
        self.publish(&mut cache, Change::Upsert(MaintenanceEvent::new(id.clone(), data)))
            .await;
        Ok(())
    }

    async fn delete(&self, id: &EventId) -> StoreResult<()> {
        let mut cache = self.cache.lock().await;
        if !self.storage.delete(&[EVENTS_COLLECTION, id.as_str()]).await? {
            return Err(not_found(id));
        }
        self.publish(&mut cache, Change::Remove(id.clone())).await;
        Ok(())
    }
}
