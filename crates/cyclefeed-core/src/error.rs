//! Core error types for cyclefeed-core.
//!
//! Each concern gets its own `thiserror` enum; [`CoreError`] aggregates
//! them so callers that drive several subsystems can use a single `?`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for cyclefeed-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Date resolution errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Key-value / item store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Program option editing errors
    #[error("Option error: {0}")]
    Option(#[from] OptionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while resolving an item's effective instant.
///
/// Both variants are data-integrity errors: they abort the placement or
/// fetch that triggered them and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A field required by the item's addressing mode is missing or malformed.
    #[error("Invalid schedule fields on item '{item_id}': {reason}")]
    InvalidScheduleFields { item_id: String, reason: String },

    /// A period-relative item references a period absent from the schedule.
    #[error("Item '{item_id}' references period {period_index}, which is not in the schedule")]
    PeriodNotFound { item_id: String, period_index: i32 },
}

/// Errors from the persistence collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A persisted value could not be decoded
    #[error("Corrupt value under '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Store could not be reached (poisoned lock, closed handle, ...)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Errors raised when editing the options attached to a scheduled item.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    /// Deselecting would leave no selected option of this type.
    #[error("Option '{option_id}' is the last selected option of type '{option_type}'")]
    LastSelectedOfType {
        option_id: String,
        option_type: String,
    },

    /// The option is not attached to the item
    #[error("Option '{0}' is not attached to this item")]
    NotFound(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
