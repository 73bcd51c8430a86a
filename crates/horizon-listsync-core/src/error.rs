//! Error types for Horizon ListSync.
//!
//! Native-control failures are expected in this layer: the host can tear a
//! window down while the list still holds items. They are reported as
//! [`ControlError`] and caught by the list engine, which logs them and turns
//! the operation into a no-op. Nothing here is meant to reach the user as a
//! crash.

/// A specialized Result type for Horizon ListSync operations.
pub type Result<T> = std::result::Result<T, ListSyncError>;

/// The main error type for Horizon ListSync operations.
#[derive(Debug, thiserror::Error)]
pub enum ListSyncError {
    /// Native control error.
    #[error("Control error: {0}")]
    Control(#[from] ControlError),
    /// Managed item error.
    #[error("Item error: {0}")]
    Item(#[from] ItemError),
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    /// Signal error.
    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),
}

/// Errors reported by a host's native list control or one of its rows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    /// The control no longer exists (its window was destroyed).
    #[error("Non-existent control {control_id}")]
    MissingControl { control_id: u32 },

    /// The row at `index` is gone or was never materialized.
    #[error("No native row at index {index}")]
    StaleRow { index: usize },

    /// Any other failure reported by the host toolkit.
    #[error("Host error: {0}")]
    Host(String),
}

impl ControlError {
    /// Create a host error.
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host(message.into())
    }

    /// Returns `true` if the whole control is gone rather than a single row.
    pub fn is_missing_control(&self) -> bool {
        matches!(self, Self::MissingControl { .. })
    }
}

/// Errors raised when mutating a managed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    /// The item was removed from its list and is frozen.
    #[error("Item has been invalidated")]
    Invalidated,

    /// The item is not attached to any list, so it has no native row.
    #[error("Item is not attached to a list")]
    Detached,

    /// The item already belongs to a live list.
    #[error("Item is already attached to a list")]
    AlreadyAttached,
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parsing error.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not usable.
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    /// Create a value error.
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Signal-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    /// The connection ID is invalid or has already been disconnected.
    #[error("Invalid or disconnected connection ID")]
    InvalidConnection,
    /// The UI task queue has been dropped and can no longer accept work.
    #[error("Failed to queue task: UI queue is closed")]
    QueueClosed,
}
