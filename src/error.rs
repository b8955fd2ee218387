//! Error types shared across the service.
//! Backend and task errors are recovered locally; store and config errors
//! reach the HTTP boundary or startup.

use thiserror::Error;

/// Failure of a single remote translation attempt.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
    #[error("translation timeout")]
    Timeout,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Failure of one of the on-disk stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Outcome of a scheduled task that did not produce a value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task timed out")]
    TimedOut,
    #[error("task panicked")]
    Panicked,
    #[error("scheduler closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
