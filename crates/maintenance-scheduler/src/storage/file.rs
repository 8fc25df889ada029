use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

use super::{validate_key, validate_keys, Storage};
use crate::error::{StoreError, StoreResult};

const EXTENSION: &str = ".json";

/// One pretty-printed JSON file per document under `root`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn build_dir(&self, keys: &[&str]) -> StoreResult<PathBuf> {
        let mut path = self.root.clone();
        for key in keys {
            validate_key(key)?;
            path.push(key);
        }
        Ok(path)
    }

    fn build_path(&self, keys: &[&str]) -> StoreResult<PathBuf> {
        validate_keys(keys)?;
        let (last, parents) = keys
            .split_last()
            .ok_or_else(|| StoreError::InvalidKey("<empty>".to_string()))?;
        let mut path = self.build_dir(parents)?;
        let mut filename = last.to_string();
        if !filename.ends_with(EXTENSION) {
            filename.push_str(EXTENSION);
        }
        path.push(filename);
        Ok(path)
    }

    async fn ensure_parent_dir(path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                StoreError::Unavailable(format!(
                    "failed to create storage directory {}: {error}",
                    parent.display()
                ))
            })?;
        }
        Ok(())
    }
}

fn io_error(action: &str, path: &Path, error: std::io::Error) -> StoreError {
    let message = format!("failed to {action} {}: {error}", path.display());
    if error.kind() == std::io::ErrorKind::PermissionDenied {
        StoreError::PermissionDenied(message)
    } else {
        StoreError::Unavailable(message)
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn write(&self, keys: &[&str], data: &Value) -> StoreResult<()> {
        let path = self.build_path(keys)?;
        Self::ensure_parent_dir(&path).await?;
        let serialized = serde_json::to_vec_pretty(data)
            .map_err(|error| StoreError::Serialization(error.to_string()))?;
        tokio::fs::write(&path, serialized)
            .await
            .map_err(|error| io_error("write storage file", &path, error))
    }

    async fn read(&self, keys: &[&str]) -> StoreResult<Option<Value>> {
        let path = self.build_path(keys)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(io_error("read storage file", &path, error)),
        };
        let value = serde_json::from_slice(&bytes).map_err(|error| {
            StoreError::Serialization(format!("{}: {error}", path.display()))
        })?;
        Ok(Some(value))
    }

    async fn list(&self, keys: &[&str]) -> StoreResult<Vec<String>> {
        validate_keys(keys)?;
        let dir = self.build_dir(keys)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(io_error("list storage directory", &dir, error)),
        };
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|error| io_error("list storage directory", &dir, error))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(stem) = name.strip_suffix(EXTENSION) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, keys: &[&str]) -> StoreResult<bool> {
        let path = self.build_path(keys)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(io_error("delete storage file", &path, error)),
        }
    }
}
