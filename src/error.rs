//! Error types for the reminder engine.
//!
//! The scheduling core itself is total: quiet-hours snapping, queue
//! operations and reminder calculation never fail. Errors only arise at the
//! edges: configuration parsing, the task store, the wake alarm and
//! notification delivery.

/// Top-level error type for the reminder engine and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum NudgeError {
    /// Configuration error (unparseable file, out-of-range time of day).
    #[error("config error: {0}")]
    Config(String),

    /// Task store read or write failure.
    #[error("store error: {0}")]
    Store(String),

    /// Wake alarm could not be programmed or cancelled.
    #[error("alarm error: {0}")]
    Alarm(String),

    /// A fired reminder could not be delivered.
    #[error("notify error: {0}")]
    Notify(String),

    /// JSON or TOML (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, NudgeError>;
