use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;

use super::{validate_keys, Storage};
use crate::error::StoreResult;

/// In-process document storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: RwLock<BTreeMap<Vec<String>, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|key| key.to_string()).collect()
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn write(&self, keys: &[&str], data: &Value) -> StoreResult<()> {
        validate_keys(keys)?;
        self.documents.write().insert(owned(keys), data.clone());
        Ok(())
    }

    async fn read(&self, keys: &[&str]) -> StoreResult<Option<Value>> {
        validate_keys(keys)?;
        Ok(self.documents.read().get(&owned(keys)).cloned())
    }

    async fn list(&self, keys: &[&str]) -> StoreResult<Vec<String>> {
        validate_keys(keys)?;
        let prefix = owned(keys);
        let documents = self.documents.read();
        Ok(documents
            .keys()
            .filter(|path| path.len() == prefix.len() + 1 && path.starts_with(&prefix))
            .filter_map(|path| path.last().cloned())
            .collect())
    }

    async fn delete(&self, keys: &[&str]) -> StoreResult<bool> {
        validate_keys(keys)?;
        Ok(self.documents.write().remove(&owned(keys)).is_some())
    }
}
