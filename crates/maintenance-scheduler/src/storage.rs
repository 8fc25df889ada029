//! Keyed JSON document storage. Keys are path segments, e.g. `["events", id]`.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};

#[async_trait]
pub trait Storage: Send + Sync {
    async fn write(&self, keys: &[&str], data: &Value) -> StoreResult<()>;
    async fn read(&self, keys: &[&str]) -> StoreResult<Option<Value>>;
    /// Names of the documents directly under `keys`, sorted.
    async fn list(&self, keys: &[&str]) -> StoreResult<Vec<String>>;
    /// Returns whether a document was removed.
    async fn delete(&self, keys: &[&str]) -> StoreResult<bool>;
}

pub type SharedStorage = Arc<dyn Storage>;

pub(crate) fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() || key == "." || key == ".." || key.contains('/') || key.contains('\\') {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_keys(keys: &[&str]) -> StoreResult<()> {
    if keys.is_empty() {
        return Err(StoreError::InvalidKey("<empty>".to_string()));
    }
    keys.iter().try_for_each(|key| validate_key(key))
}
