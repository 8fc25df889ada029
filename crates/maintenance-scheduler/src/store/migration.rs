use serde_json::Value;

use super::events::EVENTS_COLLECTION;
use crate::error::{StoreError, StoreResult};
use crate::model::{is_legacy_assignment, Assignee};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub scanned: usize,
    pub rewritten: usize,
    /// Documents that disappeared mid-scan or were not JSON objects.
    pub skipped: usize,
}

/// Rewrites every event whose `assignTo` is still a free-text label into the
/// structured form. Blank labels become unassigned. Safe to run repeatedly.
pub async fn migrate_legacy_assignments(storage: &dyn Storage) -> StoreResult<MigrationReport> {
    let mut report = MigrationReport::default();
    for id in storage.list(&[EVENTS_COLLECTION]).await? {
        report.scanned += 1;
        let keys = [EVENTS_COLLECTION, id.as_str()];
        let Some(mut document) = storage.read(&keys).await? else {
            report.skipped += 1;
            continue;
        };
        let Some(fields) = document.as_object_mut() else {
            tracing::warn!("skipping event document {id}: not a JSON object");
            report.skipped += 1;
            continue;
        };
        if !is_legacy_assignment(fields) {
            continue;
        }
        let label = fields
            .remove("assignTo")
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default();
        if let Some(assignee) = Assignee::from_legacy(&label) {
            let value = serde_json::to_value(&assignee)
                .map_err(|error| StoreError::Serialization(error.to_string()))?;
            fields.insert("assignTo".to_string(), value);
        }
        storage.write(&keys, &Value::Object(fields.clone())).await?;
        report.rewritten += 1;
    }
    tracing::info!(
        "legacy assignment migration scanned {} and rewrote {} event(s)",
        report.scanned,
        report.rewritten
    );
    Ok(report)
}
