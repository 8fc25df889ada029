use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;
use crate::storage::file::FileStorage;
use crate::storage::memory::MemoryStorage;
use crate::storage::SharedStorage;

pub const CONFIG_FILENAME: &str = "scheduler.json";
pub const CONFIG_VERSION: &str = "1.0.0";
const DATA_DIRNAME: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub version: String,
    pub click_debounce_ms: u64,
    pub notification_ms: u64,
    pub horizon_months: u32,
    pub storage: StorageKind,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            click_debounce_ms: 300,
            notification_ms: 3000,
            horizon_months: crate::recurrence::DEFAULT_HORIZON_MONTHS,
            storage: StorageKind::File,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon_months == 0 {
            return Err(ConfigError::Invalid(
                "horizon_months must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn click_delay(&self) -> Duration {
        Duration::from_millis(self.click_debounce_ms)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILENAME)
}

/// Loads `scheduler.json` from `dir`, writing defaults first if it is missing.
/// Files written by an older version are rewritten under the current version
/// with any new fields defaulted.
pub fn load_or_create_config(dir: &Path) -> Result<SchedulerConfig, ConfigError> {
    std::fs::create_dir_all(dir).map_err(|error| {
        ConfigError::Io(format!(
            "failed to create data directory {}: {error}",
            dir.display()
        ))
    })?;

    let path = config_path(dir);
    if !path.exists() {
        let config = SchedulerConfig::default();
        write_config(&path, &config)?;
        tracing::info!("created default scheduler config at {}", path.display());
        return Ok(config);
    }

    let data = std::fs::read_to_string(&path).map_err(|error| {
        ConfigError::Io(format!(
            "failed to read scheduler config {}: {error}",
            path.display()
        ))
    })?;
    let mut config: SchedulerConfig = serde_json::from_str(&data).map_err(|error| {
        ConfigError::Parse(format!(
            "failed to parse scheduler config {}: {error}",
            path.display()
        ))
    })?;
    config.validate()?;

    if config.version != CONFIG_VERSION {
        tracing::info!(
            "upgrading scheduler config from {} to {CONFIG_VERSION}",
            config.version
        );
        config.version = CONFIG_VERSION.to_string();
        write_config(&path, &config)?;
    }

    Ok(config)
}

fn write_config(path: &Path, config: &SchedulerConfig) -> Result<(), ConfigError> {
    let serialized = serde_json::to_string_pretty(config)
        .map_err(|error| ConfigError::Parse(format!("failed to serialize config: {error}")))?;
    std::fs::write(path, serialized).map_err(|error| {
        ConfigError::Io(format!(
            "failed to write scheduler config {}: {error}",
            path.display()
        ))
    })
}

/// Builds the configured document backend. File storage lives in `dir/data`.
pub fn open_storage(config: &SchedulerConfig, dir: &Path) -> SharedStorage {
    match config.storage {
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
        StorageKind::File => Arc::new(FileStorage::new(dir.join(DATA_DIRNAME))),
    }
}
