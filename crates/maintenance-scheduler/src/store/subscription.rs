//! Observer registrations for live event snapshots.
//!
//! Once [`Subscription::unsubscribe`] returns (or the guard is dropped), the
//! observer is never invoked again. A dispatch already running on another
//! thread is waited out before release returns.

use parking_lot::{Mutex, RwLock};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::model::{Assignee, MaintenanceEvent};

pub type SnapshotObserver = Box<dyn Fn(&[MaintenanceEvent]) + Send + Sync>;

/// Which events an observer receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    AssignedTo(Assignee),
}

impl Scope {
    fn filter(&self, snapshot: &[MaintenanceEvent]) -> Vec<MaintenanceEvent> {
        match self {
            Scope::All => snapshot.to_vec(),
            Scope::AssignedTo(worker) => snapshot
                .iter()
                .filter(|event| event.is_assigned_to(worker))
                .cloned()
                .collect(),
        }
    }
}

thread_local! {
    static DISPATCHING: Cell<Option<u64>> = const { Cell::new(None) };
}

struct ObserverSlot {
    id: u64,
    scope: Scope,
    active: AtomicBool,
    // held shared for the duration of a callback; release takes it exclusively
    gate: RwLock<()>,
    observer: SnapshotObserver,
}

impl ObserverSlot {
    fn deliver(&self, snapshot: &[MaintenanceEvent]) {
        let _guard = self.gate.read();
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        let events = self.scope.filter(snapshot);
        let previous = DISPATCHING.with(|current| current.replace(Some(self.id)));
        (self.observer)(events.as_slice());
        DISPATCHING.with(|current| current.set(previous));
    }
}

#[derive(Default)]
struct RegistryInner {
    slots: Mutex<Vec<Arc<ObserverSlot>>>,
    next_id: AtomicU64,
}

impl RegistryInner {
    fn release(&self, slot: &ObserverSlot) {
        if !slot.active.swap(false, Ordering::AcqRel) {
            return;
        }
        self.slots.lock().retain(|candidate| candidate.id != slot.id);
        let inside_own_callback = DISPATCHING.with(|current| current.get() == Some(slot.id));
        if !inside_own_callback {
            drop(slot.gate.write());
        }
        tracing::debug!("released event subscription {}", slot.id);
    }
}

#[derive(Clone, Default)]
pub struct ObserverRegistry {
    inner: Arc<RegistryInner>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` and delivers `initial` to it before any later
    /// snapshot.
    pub fn register(
        &self,
        scope: Scope,
        observer: SnapshotObserver,
        initial: &[MaintenanceEvent],
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(ObserverSlot {
            id,
            scope,
            active: AtomicBool::new(true),
            gate: RwLock::new(()),
            observer,
        });
        self.inner.slots.lock().push(Arc::clone(&slot));
        tracing::debug!("registered event subscription {id}");
        slot.deliver(initial);
        Subscription {
            registry: Arc::downgrade(&self.inner),
            slot,
        }
    }

    pub fn notify(&self, snapshot: &[MaintenanceEvent]) {
        let slots: Vec<Arc<ObserverSlot>> = self.inner.slots.lock().clone();
        for slot in slots {
            slot.deliver(snapshot);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Guard for a live registration. Dropping it releases the observer.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    registry: Weak<RegistryInner>,
    slot: Arc<ObserverSlot>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }

    pub fn is_active(&self) -> bool {
        self.slot.active.load(Ordering::Acquire)
    }

    fn release(&self) {
        match self.registry.upgrade() {
            Some(registry) => registry.release(&self.slot),
            None => {
                self.slot.active.store(false, Ordering::Release);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.slot.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventData, EventId};
    use chrono::NaiveDate;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn event(id: &str, assignee: Option<Assignee>) -> MaintenanceEvent {
        let mut data = EventData::new(id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        data.assign_to = assignee;
        MaintenanceEvent::new(EventId::from(id), data)
    }

    fn counting_observer(counter: Arc<AtomicUsize>) -> SnapshotObserver {
        Box::new(move |events: &[MaintenanceEvent]| {
            counter.fetch_add(events.len(), Ordering::SeqCst);
        })
    }

    #[test]
    fn initial_snapshot_then_updates() {
        let registry = ObserverRegistry::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let subscription = registry.register(
            Scope::All,
            counting_observer(seen.clone()),
            &[event("a", None)],
        );
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        registry.notify(&[event("a", None), event("b", None)]);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert!(subscription.is_active());
    }

    #[test]
    fn scoped_observer_sees_only_assigned_events() {
        let registry = ObserverRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = registry.register(
            Scope::AssignedTo(Assignee::new("jo", "smith")),
            Box::new(move |events: &[MaintenanceEvent]| {
                sink.lock()
                    .push(events.iter().map(|e| e.id.to_string()).collect::<Vec<_>>());
            }),
            &[],
        );
        registry.notify(&[
            event("mine", Some(Assignee::new("Jo", "Smith"))),
            event("theirs", Some(Assignee::new("Al", "Jones"))),
            event("nobody", None),
        ]);
        assert_eq!(*seen.lock(), vec![vec![], vec!["mine".to_string()]]);
    }

    #[test]
    fn no_callbacks_after_release() {
        let registry = ObserverRegistry::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let subscription = registry.register(Scope::All, counting_observer(seen.clone()), &[]);
        subscription.unsubscribe();
        assert!(registry.is_empty());

        registry.notify(&[event("a", None)]);
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn release_from_inside_callback_does_not_deadlock() {
        let registry = ObserverRegistry::new();
        let holder: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));
        let (inner_holder, inner_calls) = (holder.clone(), calls.clone());
        let subscription = registry.register(
            Scope::All,
            Box::new(move |_events: &[MaintenanceEvent]| {
                inner_calls.fetch_add(1, Ordering::SeqCst);
                if let Some(subscription) = inner_holder.lock().take() {
                    subscription.unsubscribe();
                }
            }),
            &[],
        );
        *holder.lock() = Some(subscription);

        registry.notify(&[]);
        registry.notify(&[]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn release_waits_for_in_flight_dispatch() {
        let registry = ObserverRegistry::new();
        let finished = Arc::new(AtomicBool::new(false));
        let started = Arc::new(AtomicBool::new(false));
        let (f, s) = (finished.clone(), started.clone());
        let subscription = registry.register(
            Scope::All,
            Box::new(move |events: &[MaintenanceEvent]| {
                if events.is_empty() {
                    return;
                }
                s.store(true, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(50));
                f.store(true, Ordering::SeqCst);
            }),
            &[],
        );

        let dispatcher = {
            let registry = registry.clone();
            std::thread::spawn(move || registry.notify(&[event("a", None)]))
        };
        while !started.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }
        subscription.unsubscribe();
        assert!(finished.load(Ordering::SeqCst));
        dispatcher.join().expect("dispatcher");
    }

    #[test]
    fn guard_outliving_registry_is_inert() {
        let registry = ObserverRegistry::new();
        let subscription = registry.register(Scope::All, Box::new(|_: &[MaintenanceEvent]| {}), &[]);
        drop(registry);
        assert!(subscription.is_active());
        drop(subscription);
    }
}
