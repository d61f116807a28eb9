//! Error types for dhtx
//!
//! Only configuration, startup glue and engine command failures surface as [`Error`].
//! Per-fetch failures (engine-reported errors, metadata timeouts, capacity rejections)
//! are normal control flow inside the crawl controller and are reported through
//! [`CrawlEvent`](crate::types::CrawlEvent) instead.

use thiserror::Error;

use crate::types::InfoHash;

/// Result type alias for dhtx operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dhtx
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_active_fetches")
        key: Option<String>,
    },

    /// A swarm engine command failed
    #[error("swarm engine error: {0}")]
    Engine(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Text could not be parsed as an infohash
    #[error("invalid infohash: {0}")]
    InvalidInfoHash(String),

    /// A completed fetch carried a descriptor without the fields needed for a report
    #[error("malformed descriptor for {info_hash}: missing {missing}")]
    MalformedDescriptor {
        /// Identifier of the completed fetch
        info_hash: InfoHash,
        /// Comma separated names of the missing fields
        missing: String,
    },

    /// The crawler is shutting down and no longer accepts commands
    #[error("shutdown in progress")]
    ShuttingDown,

    /// The crawl loop task panicked or was aborted
    #[error("crawl task failed: {0}")]
    TaskFailed(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
