//! Error types for pollen-store.

/// Result type for pollen-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pollen-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No report is stored under the requested key.
    #[error("Report not found: {0}")]
    NotFound(String),

    /// The key/value substrate could not be reached.
    #[error("Unable to connect to storage at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// A command against the key/value substrate failed.
    #[error("Storage backend error: {0}")]
    Backend(#[from] redis::RedisError),

    /// A stored record could not be decoded.
    #[error("Failed to decode record {key}: {source}")]
    Decode {
        key: String,
        source: serde_json::Error,
    },

    /// A report could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialization(serde_json::Error),
}

impl Error {
    /// Returns `true` if this error means the requested data does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Returns `true` if the substrate could not be reached or rejected a command.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Unreachable { .. } | Error::Backend(_))
    }
}
