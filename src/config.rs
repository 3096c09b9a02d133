//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Cache layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the local store can hold
    pub max_entries: usize,
    /// Background expiry sweep interval in seconds
    pub sweep_interval: u64,
    /// Path of the local snapshot file
    pub snapshot_path: PathBuf,
    /// Periodic snapshot interval in seconds
    pub snapshot_interval: u64,
    /// Snapshot is also taken after this many writes
    pub snapshot_every_writes: u64,
    /// Redis endpoint for the distributed tier; None disables remote mode
    pub redis_url: Option<String>,
    /// Key namespace prefix in the shared Redis backend
    pub remote_namespace: String,
    /// Per-call timeout for remote store operations, in milliseconds
    pub remote_timeout_ms: u64,
    /// Remote reconnect probe interval in seconds
    pub probe_interval: u64,
    /// Upstream LLM API base URL
    pub upstream_url: String,
    /// Upstream API key
    pub upstream_api_key: String,
    /// Model identifier sent to the upstream API
    pub upstream_model: String,
    /// Per-request timeout for upstream calls, in seconds
    pub upstream_timeout: u64,
    /// Maximum retry attempts for transient upstream failures
    pub upstream_max_retries: u32,
    /// TTL in seconds for conversational (high-temperature) answers
    pub ttl_conversational: u64,
    /// TTL in seconds for stable factual answers
    pub ttl_factual: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum local entries (default: 1000)
    /// - `CACHE_SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 60)
    /// - `CACHE_SNAPSHOT_PATH` - Snapshot file path (default: cache_snapshot.json)
    /// - `CACHE_SNAPSHOT_INTERVAL` - Snapshot frequency in seconds (default: 300)
    /// - `CACHE_SNAPSHOT_EVERY_WRITES` - Writes between forced snapshots (default: 50)
    /// - `CACHE_REDIS_URL` - Redis endpoint; unset means local-only mode
    /// - `CACHE_REMOTE_NAMESPACE` - Redis key prefix (default: answercache)
    /// - `CACHE_REMOTE_TIMEOUT_MS` - Remote call timeout (default: 2000)
    /// - `CACHE_PROBE_INTERVAL` - Reconnect probe frequency in seconds (default: 30)
    /// - `UPSTREAM_URL` - LLM API base URL
    /// - `UPSTREAM_API_KEY` - LLM API key
    /// - `UPSTREAM_MODEL` - Model identifier (default: gpt-4o-mini)
    /// - `UPSTREAM_TIMEOUT` - Upstream request timeout in seconds (default: 60)
    /// - `UPSTREAM_MAX_RETRIES` - Retry attempts (default: 3)
    /// - `CACHE_TTL_CONVERSATIONAL` - TTL for ephemeral answers (default: 3600)
    /// - `CACHE_TTL_FACTUAL` - TTL for stable answers (default: 86400)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_parse("CACHE_MAX_ENTRIES", defaults.max_entries),
            sweep_interval: env_parse("CACHE_SWEEP_INTERVAL", defaults.sweep_interval),
            snapshot_path: env::var("CACHE_SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            snapshot_interval: env_parse("CACHE_SNAPSHOT_INTERVAL", defaults.snapshot_interval),
            snapshot_every_writes: env_parse(
                "CACHE_SNAPSHOT_EVERY_WRITES",
                defaults.snapshot_every_writes,
            ),
            redis_url: env::var("CACHE_REDIS_URL").ok().filter(|v| !v.is_empty()),
            remote_namespace: env::var("CACHE_REMOTE_NAMESPACE")
                .unwrap_or(defaults.remote_namespace),
            remote_timeout_ms: env_parse("CACHE_REMOTE_TIMEOUT_MS", defaults.remote_timeout_ms),
            probe_interval: env_parse("CACHE_PROBE_INTERVAL", defaults.probe_interval),
            upstream_url: env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            upstream_api_key: env::var("UPSTREAM_API_KEY").unwrap_or(defaults.upstream_api_key),
            upstream_model: env::var("UPSTREAM_MODEL").unwrap_or(defaults.upstream_model),
            upstream_timeout: env_parse("UPSTREAM_TIMEOUT", defaults.upstream_timeout),
            upstream_max_retries: env_parse("UPSTREAM_MAX_RETRIES", defaults.upstream_max_retries),
            ttl_conversational: env_parse("CACHE_TTL_CONVERSATIONAL", defaults.ttl_conversational),
            ttl_factual: env_parse("CACHE_TTL_FACTUAL", defaults.ttl_factual),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            sweep_interval: 60,
            snapshot_path: PathBuf::from("cache_snapshot.json"),
            snapshot_interval: 300,
            snapshot_every_writes: 50,
            redis_url: None,
            remote_namespace: "answercache".to_string(),
            remote_timeout_ms: 2000,
            probe_interval: 30,
            upstream_url: "https://api.openai.com/v1/completions".to_string(),
            upstream_api_key: String::new(),
            upstream_model: "gpt-4o-mini".to_string(),
            upstream_timeout: 60,
            upstream_max_retries: 3,
            ttl_conversational: 3600,
            ttl_factual: 86_400,
        }
    }
}

/// Parses an environment variable, falling back to the default on absence or parse failure.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
