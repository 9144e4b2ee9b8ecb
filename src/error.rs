use thiserror::Error;

/// Errors that can occur during broker operations
#[derive(Error, Debug)]
pub enum Error {
    /// Caller passed an empty topic or an otherwise unusable argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation attempted after the broker was closed
    #[error("broker is closed")]
    Closed,

    /// A subscriber handler reported a failure.
    ///
    /// This error is local to the failing subscriber: the broker logs it
    /// and continues dispatching to the remaining subscribers. It is never
    /// surfaced through `publish()`.
    #[error("handler failed: {0}")]
    Handler(String),

    /// JSON serialization of a message body failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend selection or backend-specific failure
    #[error("backend error: {0}")]
    Backend(String),

    /// Required builder/config field missing
    #[error("missing required config: {0}")]
    MissingConfig(String),
}

/// Result type alias for broker operations
pub type Result<T> = std::result::Result<T, Error>;
