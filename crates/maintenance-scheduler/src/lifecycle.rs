//! Event Lifecycle Manager: validation, assignment rules, and series
//! expansion on top of an [`EventStore`](crate::store::EventStore).

use chrono::NaiveDate;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::error::{SchedulerResult, StoreError, StoreResult};
use crate::model::{Caller, EventChanges, EventData, EventId, EventPatch, MaintenanceEvent};
use crate::recurrence::{horizon_after, project_series, DEFAULT_HORIZON_MONTHS};
use crate::store::SharedEventStore;

/// A series member that could not be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesFailure {
    pub date: NaiveDate,
    pub error: StoreError,
}

#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub event: MaintenanceEvent,
    pub series: Vec<MaintenanceEvent>,
    pub failures: Vec<SeriesFailure>,
}

impl CreateOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total_created(&self) -> usize {
        1 + self.series.len()
    }
}

pub struct EventManager {
    store: SharedEventStore,
    clock: Arc<dyn Clock>,
    horizon_months: u32,
}

impl EventManager {
    pub fn new(store: SharedEventStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            horizon_months: DEFAULT_HORIZON_MONTHS,
        }
    }

    /// Manager with the series horizon taken from `config`.
    pub fn from_config(store: SharedEventStore, clock: Arc<dyn Clock>, config: &SchedulerConfig) -> Self {
        Self::new(store, clock).with_horizon_months(config.horizon_months)
    }

    pub fn with_horizon_months(mut self, months: u32) -> Self {
        self.horizon_months = months;
        self
    }

    pub fn store(&self) -> &SharedEventStore {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Persists `draft` and, when it recurs, one event per occurrence up to
    /// the horizon. Members are written in date order; a failed member is
    /// reported in the outcome and does not stop the rest.
    pub async fn create_event(&self, mut draft: EventData, caller: &Caller) -> SchedulerResult<CreateOutcome> {
        draft.validate()?;
        if !caller.is_admin() {
            draft.assign_to = Some(caller.identity.clone());
        }
        draft.refresh_next_maintenance_date()?;

        let event = logged("create event", self.store.create(&draft).await)?;
        tracing::info!("created event {} on {}", event.id, event.data.date);

        let mut outcome = CreateOutcome {
            event,
            series: Vec::new(),
            failures: Vec::new(),
        };
        if !outcome.event.data.is_recurring() {
            return Ok(outcome);
        }

        let horizon = horizon_after(self.clock.today(), self.horizon_months);
        for member in project_series(&outcome.event.data, horizon) {
            let date = member.date;
            match self.store.create(&member).await {
                Ok(created) => outcome.series.push(created),
                Err(error) => {
                    tracing::warn!("failed to create series member on {date}: {error}");
                    outcome.failures.push(SeriesFailure { date, error });
                }
            }
        }
        tracing::info!(
            "expanded event {} into {} series member(s) through {horizon}, {} failed",
            outcome.event.id,
            outcome.series.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }

    /// Applies `changes` to a stored event and recomputes its next date from
    /// the merged values. Never generates series members.
    pub async fn update_event(
        &self,
        id: &EventId,
        mut changes: EventChanges,
        caller: &Caller,
    ) -> SchedulerResult<MaintenanceEvent> {
        if !caller.is_admin() {
            changes.assign_to = Some(Some(caller.identity.clone()));
        }
        let existing = logged("load event", self.store.get(id).await)?;

        let mut merged = existing.data.clone();
        changes.apply_to(&mut merged);
        merged.validate()?;
        merged.refresh_next_maintenance_date()?;

        let next_changed = merged.next_maintenance_date != existing.data.next_maintenance_date;
        let patch = EventPatch {
            changes,
            next_maintenance_date: next_changed.then_some(merged.next_maintenance_date),
        };
        logged("update event", self.store.update(id, &patch).await)?;
        tracing::info!("updated event {id}");
        Ok(MaintenanceEvent::new(id.clone(), merged))
    }

    /// Changes only the scheduled date; the recurrence chain is untouched.
    pub async fn move_event(&self, id: &EventId, new_date: NaiveDate) -> SchedulerResult<()> {
        logged("move event", self.store.update(id, &EventPatch::date_only(new_date)).await)?;
        tracing::info!("moved event {id} to {new_date}");
        Ok(())
    }

    /// Permanent. Other members of the same series are left alone.
    pub async fn delete_event(&self, id: &EventId) -> SchedulerResult<()> {
        logged("delete event", self.store.delete(id).await)?;
        tracing::info!("deleted event {id}");
        Ok(())
    }
}

fn logged<T>(operation: &str, result: StoreResult<T>) -> StoreResult<T> {
    if let Err(error) = &result {
        tracing::warn!("{operation} failed: {error}");
    }
    result
}
