//! Error types for each layer of the scheduler.

/// Input rejected before any write is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("event title must not be empty")]
    EmptyTitle,

    #[error("maintenance frequency must be a positive number of days, got {0}")]
    InvalidFrequency(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecurrenceError {
    #[error("frequency must be a positive number of days, got {0}")]
    InvalidFrequency(i64),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("date arithmetic out of range")]
    OutOfRange,
}

/// Failures reported by the document store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid storage key {0}")]
    InvalidKey(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("config IO error: {0}")]
    Io(String),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Boundary error returned by the lifecycle manager and calendar controller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type SchedulerResult<T> = Result<T, SchedulerError>;
