use thiserror::Error;

/// Failure while writing the published artifact.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    /// Provider unreachable, timed out, or returned malformed data.
    /// Retried by the orchestrator up to the configured attempt count.
    #[error("market data unavailable: {0}")]
    DataUnavailable(String),

    /// The provider answered but no symbol yielded usable data.
    #[error("no symbol yielded usable market data")]
    NoData,

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the fetch-retry loop may try again within the same cycle.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::DataUnavailable(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
