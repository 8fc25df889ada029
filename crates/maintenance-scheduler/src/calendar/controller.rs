use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use super::debounce::{ClickAction, ClickDebouncer};
use super::form::EventForm;
use super::notification::{Notification, Notifier};
use super::view::{group_events, CalendarView, EventGroups};
use crate::config::SchedulerConfig;
use crate::error::{SchedulerError, SchedulerResult, ValidationError};
use crate::lifecycle::{EventManager, SeriesFailure};
use crate::model::{Caller, EventId, MaintenanceEvent};
use crate::store::{SnapshotObserver, Subscription};

const CREATED: &str = "Event created successfully";
const UPDATED: &str = "Event updated successfully";
const MOVED: &str = "Event moved successfully";
const DELETED: &str = "Event deleted successfully";
const CREATE_FAILED: &str = "Error creating event";
const UPDATE_FAILED: &str = "Error updating event";
const MOVE_FAILED: &str = "Error moving event";
const DELETE_FAILED: &str = "Error deleting event";

/// The single open dialog, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    None,
    DayDetail {
        date: NaiveDate,
    },
    Create {
        form: EventForm,
    },
    Update {
        event_id: EventId,
        form: EventForm,
    },
    ConfirmDelete {
        event: MaintenanceEvent,
        /// Day detail to reopen once the delete succeeds.
        return_to: Option<NaiveDate>,
    },
}

impl Modal {
    /// Dialogs that hold unsaved input and block calendar clicks.
    fn is_blocking(&self) -> bool {
        matches!(
            self,
            Modal::Create { .. } | Modal::Update { .. } | Modal::ConfirmDelete { .. }
        )
    }
}

#[derive(Debug)]
pub enum SubmitResult {
    /// No create or update form was open.
    NoForm,
    Invalid(ValidationError),
    Saved(MaintenanceEvent),
    PartiallySaved {
        event: MaintenanceEvent,
        failures: Vec<SeriesFailure>,
    },
    Failed(SchedulerError),
}

#[derive(Default)]
struct LiveState {
    calendar: CalendarView,
    personal: Vec<MaintenanceEvent>,
}

/// Calendar screen state for one signed-in user. Holds no persistence logic;
/// every write goes through the [`EventManager`].
pub struct CalendarController {
    manager: Arc<EventManager>,
    caller: Caller,
    live: Arc<Mutex<LiveState>>,
    subscriptions: Vec<Subscription>,
    debouncer: ClickDebouncer,
    modal: Modal,
    notifier: Notifier,
}

impl CalendarController {
    pub fn new(manager: Arc<EventManager>, caller: Caller, config: &SchedulerConfig) -> Self {
        Self {
            manager,
            caller,
            live: Arc::new(Mutex::new(LiveState::default())),
            subscriptions: Vec::new(),
            debouncer: ClickDebouncer::new(config.click_delay()),
            modal: Modal::None,
            notifier: Notifier::new(config.notification_duration()),
        }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    /// Subscribes the calendar to every event and the personal list to the
    /// caller's events (every event for admins).
    pub async fn attach(&mut self) -> SchedulerResult<()> {
        self.detach();
        let store = Arc::clone(self.manager.store());

        let live = Arc::clone(&self.live);
        let calendar_observer: SnapshotObserver = Box::new(move |events: &[MaintenanceEvent]| {
            live.lock().calendar.replace(events);
        });
        let calendar = store.subscribe_all(calendar_observer).await?;

        let live = Arc::clone(&self.live);
        let personal_observer: SnapshotObserver = Box::new(move |events: &[MaintenanceEvent]| {
            live.lock().personal = events.to_vec();
        });
        let personal = if self.caller.is_admin() {
            store.subscribe_all(personal_observer).await?
        } else {
            store
                .subscribe_assigned_to(&self.caller.identity, personal_observer)
                .await?
        };

        self.subscriptions = vec![calendar, personal];
        tracing::debug!("calendar attached for user {}", self.caller.user_id);
        Ok(())
    }

    pub fn detach(&mut self) {
        self.subscriptions.clear();
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn events_on(&self, date: NaiveDate) -> Vec<MaintenanceEvent> {
        self.live.lock().calendar.events_on(date).to_vec()
    }

    pub fn month_view(&self, year: i32, month: u32) -> BTreeMap<NaiveDate, Vec<MaintenanceEvent>> {
        self.live.lock().calendar.month(year, month)
    }

    pub fn personal_events(&self) -> Vec<MaintenanceEvent> {
        self.live.lock().personal.clone()
    }

    pub fn groups(&self) -> EventGroups {
        group_events(&self.live.lock().personal)
    }

    pub fn click_date(&mut self, date: NaiveDate, now: Instant) -> Option<ClickAction> {
        if self.modal.is_blocking() {
            self.debouncer.cancel();
            return None;
        }
        let action = self.debouncer.click(date, now)?;
        self.apply_click(action);
        Some(action)
    }

    /// Advances timers: settles a pending single click and expires the
    /// notification.
    pub fn poll(&mut self, now: Instant) -> Option<ClickAction> {
        self.notifier.expire(now);
        let action = self.debouncer.poll(now)?;
        self.apply_click(action);
        Some(action)
    }

    /// Earliest instant at which [`CalendarController::poll`] has work to do.
    pub fn pending_deadline(&self) -> Option<Instant> {
        match (self.debouncer.pending_deadline(), self.notifier.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn apply_click(&mut self, action: ClickAction) {
        self.modal = match action {
            ClickAction::ViewDay(date) => Modal::DayDetail { date },
            ClickAction::CreateOnDay(date) => Modal::Create {
                form: EventForm::for_date(date),
            },
        };
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn form(&self) -> Option<&EventForm> {
        match &self.modal {
            Modal::Create { form } | Modal::Update { form, .. } => Some(form),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut EventForm> {
        match &mut self.modal {
            Modal::Create { form } | Modal::Update { form, .. } => Some(form),
            _ => None,
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = Modal::None;
    }

    /// Opens the update form for an event currently on the calendar.
    pub fn edit_event(&mut self, id: &EventId) -> bool {
        let Some(event) = self.live.lock().calendar.find(id).cloned() else {
            return false;
        };
        self.modal = Modal::Update {
            event_id: event.id.clone(),
            form: EventForm::from_event(&event),
        };
        true
    }

    pub async fn submit_create(&mut self, now: Instant) -> SubmitResult {
        let Modal::Create { form } = &mut self.modal else {
            return SubmitResult::NoForm;
        };
        let draft = match form.begin_submit() {
            Ok(draft) => draft,
            Err(error) => return SubmitResult::Invalid(error),
        };

        let result = self.manager.create_event(draft, &self.caller).await;
        match result {
            Ok(outcome) if outcome.is_complete() => {
                self.modal = Modal::None;
                self.notifier.success(CREATED, now);
                SubmitResult::Saved(outcome.event)
            }
            Ok(outcome) => {
                self.modal = Modal::None;
                let dates: Vec<String> = outcome
                    .failures
                    .iter()
                    .map(|failure| failure.date.to_string())
                    .collect();
                self.notifier.error(
                    format!("Event created, but scheduling failed for {}", dates.join(", ")),
                    now,
                );
                SubmitResult::PartiallySaved {
                    event: outcome.event,
                    failures: outcome.failures,
                }
            }
            Err(error) => self.fail_submit(error, CREATE_FAILED, now),
        }
    }

    pub async fn submit_update(&mut self, now: Instant) -> SubmitResult {
        let Modal::Update { event_id, form } = &mut self.modal else {
            return SubmitResult::NoForm;
        };
        if let Err(error) = form.begin_submit() {
            return SubmitResult::Invalid(error);
        }
        let (id, changes) = (event_id.clone(), form.changes());

        match self.manager.update_event(&id, changes, &self.caller).await {
            Ok(event) => {
                self.modal = Modal::None;
                self.notifier.success(UPDATED, now);
                SubmitResult::Saved(event)
            }
            Err(error) => self.fail_submit(error, UPDATE_FAILED, now),
        }
    }

    fn fail_submit(&mut self, error: SchedulerError, message: &str, now: Instant) -> SubmitResult {
        if let Some(form) = self.form_mut() {
            match &error {
                SchedulerError::Validation(invalid) => form.show_error(invalid.clone()),
                other => form.mark_failed(other.to_string()),
            }
        }
        if let SchedulerError::Validation(invalid) = error {
            return SubmitResult::Invalid(invalid);
        }
        self.notifier.error(message, now);
        SubmitResult::Failed(error)
    }

    pub async fn move_event(&mut self, id: &EventId, new_date: NaiveDate, now: Instant) -> SchedulerResult<()> {
        match self.manager.move_event(id, new_date).await {
            Ok(()) => {
                self.notifier.success(MOVED, now);
                Ok(())
            }
            Err(error) => {
                self.notifier.error(MOVE_FAILED, now);
                Err(error)
            }
        }
    }

    /// Asks for confirmation before deleting an event on the calendar.
    pub fn request_delete(&mut self, id: &EventId) -> bool {
        let Some(event) = self.live.lock().calendar.find(id).cloned() else {
            return false;
        };
        let return_to = match self.modal {
            Modal::DayDetail { date } => Some(date),
            _ => None,
        };
        self.modal = Modal::ConfirmDelete { event, return_to };
        true
    }

    pub fn cancel_delete(&mut self) {
        if let Modal::ConfirmDelete { return_to, .. } = self.modal {
            self.modal = return_to.map_or(Modal::None, |date| Modal::DayDetail { date });
        }
    }

    /// Deletes the event awaiting confirmation. Returns `Ok(false)` when no
    /// confirmation is open. On failure the confirmation stays open.
    pub async fn confirm_delete(&mut self, now: Instant) -> SchedulerResult<bool> {
        let Modal::ConfirmDelete { event, return_to } = &self.modal else {
            return Ok(false);
        };
        let (id, return_to) = (event.id.clone(), *return_to);

        match self.manager.delete_event(&id).await {
            Ok(()) => {
                self.modal = return_to.map_or(Modal::None, |date| Modal::DayDetail { date });
                self.notifier.success(DELETED, now);
                Ok(true)
            }
            Err(error) => {
                self.notifier.error(DELETE_FAILED, now);
                Err(error)
            }
        }
    }

    pub fn notification(&self, now: Instant) -> Option<&Notification> {
        self.notifier.current(now)
    }

    pub fn dismiss_notification(&mut self) {
        self.notifier.dismiss();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::form::FormState;
    use crate::calendar::notification::NotificationKind;
    use crate::clock::FixedClock;
    use crate::error::StoreError;
    use crate::model::{Assignee, EventData, EventPatch, Role};
    use crate::storage::memory::MemoryStorage;
    use crate::store::{DocumentEventStore, EventStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn admin() -> Caller {
        Caller {
            user_id: "admin".to_string(),
            role: Role::Admin,
            identity: Assignee::new("Ada", "Admin"),
        }
    }

    fn worker() -> Caller {
        Caller {
            user_id: "w1".to_string(),
            role: Role::Worker,
            identity: Assignee::new("Jo", "Smith"),
        }
    }

    /// Real store whose writes can be switched off.
    struct SwitchableStore {
        inner: DocumentEventStore,
        offline: AtomicBool,
    }

    impl SwitchableStore {
        fn check(&self) -> Result<(), StoreError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("offline".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EventStore for SwitchableStore {
        async fn subscribe_all(&self, observer: SnapshotObserver) -> Result<Subscription, StoreError> {
            self.inner.subscribe_all(observer).await
        }

        async fn subscribe_assigned_to(
            &self,
            worker: &Assignee,
            observer: SnapshotObserver,
        ) -> Result<Subscription, StoreError> {
            self.inner.subscribe_assigned_to(worker, observer).await
        }

        async fn create(&self, draft: &EventData) -> Result<MaintenanceEvent, StoreError> {
            self.check()?;
            self.inner.create(draft).await
        }

        async fn get(&self, id: &EventId) -> Result<MaintenanceEvent, StoreError> {
            self.inner.get(id).await
        }

        async fn update(&self, id: &EventId, patch: &EventPatch) -> Result<(), StoreError> {
            self.check()?;
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: &EventId) -> Result<(), StoreError> {
            self.check()?;
            self.inner.delete(id).await
        }
    }

    fn setup(caller: Caller) -> (Arc<SwitchableStore>, Arc<EventManager>, CalendarController) {
        let store = Arc::new(SwitchableStore {
            inner: DocumentEventStore::new(Arc::new(MemoryStorage::new())),
            offline: AtomicBool::new(false),
        });
        let manager = Arc::new(EventManager::new(store.clone(), Arc::new(FixedClock(ymd(2024, 1, 1)))));
        let controller = CalendarController::new(manager.clone(), caller, &SchedulerConfig::default());
        (store, manager, controller)
    }

    fn open_create(controller: &mut CalendarController, date: NaiveDate, now: Instant) {
        controller.click_date(date, now);
        controller.click_date(date, now + Duration::from_millis(100));
        assert!(matches!(controller.modal(), Modal::Create { .. }));
    }

    #[tokio::test]
    async fn single_click_opens_day_detail_after_delay() {
        let (_, _, mut controller) = setup(admin());
        let start = Instant::now();
        assert_eq!(controller.click_date(ymd(2024, 5, 1), start), None);
        assert_eq!(controller.modal(), &Modal::None);
        assert_eq!(controller.pending_deadline(), Some(start + Duration::from_millis(300)));

        assert_eq!(controller.poll(start + Duration::from_millis(200)), None);
        assert_eq!(
            controller.poll(start + Duration::from_millis(300)),
            Some(ClickAction::ViewDay(ymd(2024, 5, 1)))
        );
        assert_eq!(controller.modal(), &Modal::DayDetail { date: ymd(2024, 5, 1) });
    }

    #[tokio::test]
    async fn double_click_opens_create_for_second_date_only() {
        let (_, _, mut controller) = setup(admin());
        let start = Instant::now();
        controller.click_date(ymd(2024, 5, 1), start);
        assert_eq!(
            controller.click_date(ymd(2024, 5, 2), start + Duration::from_millis(150)),
            Some(ClickAction::CreateOnDay(ymd(2024, 5, 2)))
        );
        assert_eq!(controller.form().map(|form| form.data().date), Some(ymd(2024, 5, 2)));

        assert_eq!(controller.poll(start + Duration::from_secs(2)), None);
        assert!(matches!(controller.modal(), Modal::Create { .. }));
    }

    #[tokio::test]
    async fn clicks_are_ignored_while_a_form_is_open() {
        let (_, _, mut controller) = setup(admin());
        let start = Instant::now();
        open_create(&mut controller, ymd(2024, 5, 1), start);
        assert_eq!(controller.click_date(ymd(2024, 6, 1), start + Duration::from_secs(1)), None);
        assert_eq!(controller.poll(start + Duration::from_secs(3)), None);
        assert_eq!(controller.form().map(|form| form.data().date), Some(ymd(2024, 5, 1)));
    }

    #[tokio::test]
    async fn create_closes_modal_and_updates_view() {
        let (_, _, mut controller) = setup(admin());
        controller.attach().await.expect("attach");
        let now = Instant::now();
        open_create(&mut controller, ymd(2024, 5, 1), now);

        let form = controller.form_mut().expect("form");
        form.set_title("Filter swap");
        form.set_last_maintenance_date(Some(ymd(2024, 5, 1)));
        form.set_maintenance_frequency(Some(120));
        assert_eq!(form.next_maintenance_date(), Some(ymd(2024, 8, 29)));

        let result = controller.submit_create(now).await;
        assert!(matches!(result, SubmitResult::Saved(_)), "{result:?}");
        assert_eq!(controller.modal(), &Modal::None);

        let notification = controller.notification(now).expect("notification");
        assert_eq!(notification.kind, NotificationKind::Success);
        assert_eq!(notification.message, "Event created successfully");
        assert!(controller.notification(now + Duration::from_millis(3000)).is_none());

        assert_eq!(controller.events_on(ymd(2024, 5, 1)).len(), 1);
        assert_eq!(controller.events_on(ymd(2024, 8, 29)).len(), 1);
        assert_eq!(controller.events_on(ymd(2024, 12, 27)).len(), 1);
        assert_eq!(controller.month_view(2024, 8).len(), 1);
        assert_eq!(controller.groups().upcoming.len(), 3);
    }

    #[tokio::test]
    async fn invalid_form_stays_open_without_write() {
        let (store, _, mut controller) = setup(admin());
        let now = Instant::now();
        open_create(&mut controller, ymd(2024, 5, 1), now);

        let result = controller.submit_create(now).await;
        assert!(matches!(result, SubmitResult::Invalid(ValidationError::EmptyTitle)));
        assert_eq!(
            controller.form().and_then(|form| form.error()),
            Some(&ValidationError::EmptyTitle)
        );
        assert!(controller.notification(now).is_none());
        assert!(store.inner.snapshot().await.expect("snapshot").is_empty());
    }

    #[tokio::test]
    async fn store_failure_keeps_form_and_notifies() {
        let (store, _, mut controller) = setup(admin());
        store.offline.store(true, Ordering::SeqCst);
        let now = Instant::now();
        open_create(&mut controller, ymd(2024, 5, 1), now);
        controller.form_mut().expect("form").set_title("x");

        let result = controller.submit_create(now).await;
        assert!(matches!(result, SubmitResult::Failed(SchedulerError::Store(_))));
        let form = controller.form().expect("form still open");
        assert!(matches!(form.state(), FormState::Failed(_)));
        assert!(form.is_editable());
        assert_eq!(
            controller.notification(now).map(|n| (n.kind, n.message.as_str())),
            Some((NotificationKind::Error, "Error creating event"))
        );

        store.offline.store(false, Ordering::SeqCst);
        assert!(matches!(controller.submit_create(now).await, SubmitResult::Saved(_)));
    }

    #[tokio::test]
    async fn worker_sees_everything_on_calendar_but_only_own_list() {
        let (_, manager, mut controller) = setup(worker());
        manager
            .create_event(
                EventData::new("theirs", ymd(2024, 2, 1)).with_assignee(Assignee::new("Al", "Jones")),
                &admin(),
            )
            .await
            .expect("create");
        controller.attach().await.expect("attach");

        let now = Instant::now();
        open_create(&mut controller, ymd(2024, 2, 2), now);
        let form = controller.form_mut().expect("form");
        form.set_title("mine");
        form.set_assignee(Some(Assignee::new("Al", "Jones")));
        let SubmitResult::Saved(event) = controller.submit_create(now).await else {
            panic!("expected save");
        };
        assert_eq!(event.data.assign_to, Some(Assignee::new("Jo", "Smith")));

        assert_eq!(controller.events_on(ymd(2024, 2, 1)).len(), 1);
        let personal: Vec<_> = controller
            .personal_events()
            .into_iter()
            .map(|event| event.data.title)
            .collect();
        assert_eq!(personal, vec!["mine"]);
    }

    #[tokio::test]
    async fn edit_update_flow() {
        let (_, manager, mut controller) = setup(admin());
        let created = manager
            .create_event(EventData::new("Boiler", ymd(2024, 3, 1)), &admin())
            .await
            .expect("create");
        controller.attach().await.expect("attach");

        assert!(controller.edit_event(&created.event.id));
        let form = controller.form_mut().expect("form");
        form.set_title("Boiler service");
        form.set_completed(true);
        let now = Instant::now();
        assert!(matches!(controller.submit_update(now).await, SubmitResult::Saved(_)));
        assert_eq!(controller.modal(), &Modal::None);
        assert_eq!(
            controller.notification(now).map(|n| n.message.as_str()),
            Some("Event updated successfully")
        );

        let groups = controller.groups();
        assert!(groups.upcoming.is_empty());
        assert_eq!(groups.completed[0].data.title, "Boiler service");
    }

    #[tokio::test]
    async fn delete_confirmation_returns_to_day_detail() {
        let (_, manager, mut controller) = setup(admin());
        let created = manager
            .create_event(EventData::new("Old unit", ymd(2024, 3, 1)), &admin())
            .await
            .expect("create");
        controller.attach().await.expect("attach");

        let start = Instant::now();
        controller.click_date(ymd(2024, 3, 1), start);
        controller.poll(start + Duration::from_millis(300));
        assert!(controller.request_delete(&created.event.id));
        controller.cancel_delete();
        assert_eq!(controller.modal(), &Modal::DayDetail { date: ymd(2024, 3, 1) });

        assert!(controller.request_delete(&created.event.id));
        assert!(controller.confirm_delete(start).await.expect("delete"));
        assert_eq!(controller.modal(), &Modal::DayDetail { date: ymd(2024, 3, 1) });
        assert!(controller.events_on(ymd(2024, 3, 1)).is_empty());
        assert!(!controller.confirm_delete(start).await.expect("nothing pending"));
    }

    #[tokio::test]
    async fn failed_delete_keeps_confirmation_open() {
        let (store, manager, mut controller) = setup(admin());
        let created = manager
            .create_event(EventData::new("x", ymd(2024, 3, 1)), &admin())
            .await
            .expect("create");
        controller.attach().await.expect("attach");
        assert!(controller.request_delete(&created.event.id));

        store.offline.store(true, Ordering::SeqCst);
        let now = Instant::now();
        assert!(controller.confirm_delete(now).await.is_err());
        assert!(matches!(controller.modal(), Modal::ConfirmDelete { .. }));
        assert_eq!(
            controller.notification(now).map(|n| n.message.as_str()),
            Some("Error deleting event")
        );
    }

    #[tokio::test]
    async fn move_event_notifies() {
        let (_, manager, mut controller) = setup(admin());
        let created = manager
            .create_event(EventData::new("x", ymd(2024, 3, 1)), &admin())
            .await
            .expect("create");
        controller.attach().await.expect("attach");
        let now = Instant::now();
        controller
            .move_event(&created.event.id, ymd(2024, 3, 8), now)
            .await
            .expect("move");
        assert_eq!(controller.events_on(ymd(2024, 3, 8)).len(), 1);
        assert_eq!(controller.notification(now).map(|n| n.message.as_str()), Some("Event moved successfully"));
        controller.dismiss_notification();
        assert!(controller.notification(now).is_none());
    }

    #[tokio::test]
    async fn detach_stops_updates() {
        let (_, manager, mut controller) = setup(admin());
        controller.attach().await.expect("attach");
        assert!(controller.is_attached());
        controller.detach();
        manager
            .create_event(EventData::new("x", ymd(2024, 3, 1)), &admin())
            .await
            .expect("create");
        assert!(controller.events_on(ymd(2024, 3, 1)).is_empty());
    }
}
