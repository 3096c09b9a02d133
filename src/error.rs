//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.
//!
//! Storage-layer errors ([`RemoteError`], [`PersistError`]) are absorbed at
//! the cache boundary and surface only through stats counters and logs.
//! [`UpstreamError`] is the one error type callers see: it distinguishes a
//! failed generation from a plain cache miss.

use thiserror::Error;

// == Remote Store Errors ==
/// Failures of the distributed cache tier.
///
/// Every variant triggers failover to local-only mode; none of them
/// propagate past the coordinator.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Underlying Redis command or connection failure
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Operation exceeded the configured timeout
    #[error("remote operation timed out after {0}ms")]
    Timeout(u64),

    /// Stored envelope could not be decoded
    #[error("malformed remote envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    /// Envelope carried a version this build does not understand
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),
}

// == Persistence Errors ==
/// Failures while saving or loading the local snapshot file.
#[derive(Error, Debug)]
pub enum PersistError {
    /// Filesystem failure
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot serialization/deserialization failure
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Snapshot carried a version this build does not understand
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u8),
}

// == Upstream Errors ==
/// Failures of the upstream LLM API, surfaced to callers after retries
/// are exhausted. A failed generation is never cached.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status that is not retryable
    #[error("upstream returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated for logging
        body: String,
    },

    /// Success response whose completion text was empty (soft failure)
    #[error("upstream returned an empty completion")]
    EmptyCompletion,

    /// All retry attempts failed with transient errors
    #[error("upstream unavailable after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Description of the last failure
        last_error: String,
    },
}

// == Result Type Aliases ==
/// Result of a remote store operation.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Result of a snapshot save/load.
pub type PersistResult<T> = std::result::Result<T, PersistError>;

/// Result of an upstream generation call.
pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;
