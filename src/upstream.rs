//! Upstream Gateway Module
//!
//! Throttled, retrying client for the upstream LLM API. Reached only on a
//! full cache miss; its output determines what gets cached and for how
//! long. Calls are serialized through a single-permit semaphore as
//! deliberate backpressure against the provider's rate limit.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{UpstreamError, UpstreamResult};
use crate::key::GenerationParams;

/// Temperature threshold (in hundredths) separating conversational
/// prompts from stable factual lookups.
const CONVERSATIONAL_TEMPERATURE_PCT: u32 = 70;

/// First retry delay; doubles per attempt.
const BACKOFF_BASE_MS: u64 = 500;

/// Log a queueing delay longer than this.
const QUEUE_WARN_MS: u128 = 1_000;

// == Request / Response ==
/// A single upstream generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The full prompt text
    pub prompt: String,
    /// Generation parameters; also part of the cache fingerprint
    pub params: GenerationParams,
}

/// A successful generation, ready to be cached by the caller.
#[derive(Debug, Clone)]
pub struct Generation {
    /// The completion text
    pub text: String,
    /// TTL the caller should pass to `CacheCoordinator::set`
    pub ttl_secs: u64,
}

/// Upstream wire request body.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
}

/// Upstream wire response body.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

// == Upstream Gateway ==
/// Pooled HTTP client with bounded retries and single-flight throttling.
#[derive(Debug)]
pub struct UpstreamGateway {
    /// Pooled HTTP client with the per-request timeout baked in
    client: Client,
    /// Completion endpoint URL
    url: String,
    /// Bearer token for the upstream API
    api_key: String,
    /// Single permit: one upstream call in flight at a time
    throttle: Semaphore,
    /// Maximum retry attempts on transient failures
    max_retries: u32,
    /// TTL for conversational (high-temperature) answers
    ttl_conversational: u64,
    /// TTL for stable factual answers
    ttl_factual: u64,
}

impl UpstreamGateway {
    // == Constructor ==
    /// Builds the gateway from configuration.
    pub fn new(config: &Config) -> UpstreamResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout))
            .build()?;
        Ok(Self {
            client,
            url: config.upstream_url.clone(),
            api_key: config.upstream_api_key.clone(),
            throttle: Semaphore::new(1),
            max_retries: config.upstream_max_retries,
            ttl_conversational: config.ttl_conversational,
            ttl_factual: config.ttl_factual,
        })
    }

    // == Generate ==
    /// Produces a completion for the request.
    ///
    /// Retries transient failures (connect errors, timeouts, 429, 5xx)
    /// with exponential backoff up to the configured attempt limit. A
    /// success with empty content is [`UpstreamError::EmptyCompletion`]
    /// and must not be cached.
    pub async fn generate(&self, request: &GenerationRequest) -> UpstreamResult<Generation> {
        let queued_at = Instant::now();
        // Holds every concurrent caller in line behind one in-flight call.
        let _permit = self
            .throttle
            .acquire()
            .await
            .expect("upstream throttle semaphore closed");
        let queued_ms = queued_at.elapsed().as_millis();
        if queued_ms > QUEUE_WARN_MS {
            debug!(queued_ms, "Upstream call was queued behind the rate limit");
        }

        let mut last_error = String::new();
        let mut attempts = 0u32;

        while attempts <= self.max_retries {
            if attempts > 0 {
                let delay = Duration::from_millis(BACKOFF_BASE_MS << (attempts - 1).min(6));
                debug!(attempt = attempts, ?delay, "Retrying upstream call");
                tokio::time::sleep(delay).await;
            }
            attempts += 1;

            match self.call_once(request).await {
                Ok(text) => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        // Soft failure: the provider answered but produced
                        // nothing worth caching.
                        return Err(UpstreamError::EmptyCompletion);
                    }
                    return Ok(Generation {
                        text: trimmed.to_string(),
                        ttl_secs: self.ttl_for(request),
                    });
                }
                Err(CallFailure::Transient(reason)) => {
                    warn!(attempt = attempts, %reason, "Transient upstream failure");
                    last_error = reason;
                }
                Err(CallFailure::Fatal(error)) => return Err(error),
            }
        }

        Err(UpstreamError::RetriesExhausted {
            attempts,
            last_error,
        })
    }

    // == TTL Policy ==
    /// Chooses the cache TTL for a freshly produced value.
    ///
    /// High-temperature prompts are conversational and go stale quickly;
    /// low-temperature prompts are treated as stable factual lookups.
    pub fn ttl_for(&self, request: &GenerationRequest) -> u64 {
        if request.params.temperature_pct >= CONVERSATIONAL_TEMPERATURE_PCT {
            self.ttl_conversational
        } else {
            self.ttl_factual
        }
    }

    // == Internal ==
    /// One HTTP attempt, classified as success, transient, or fatal.
    async fn call_once(&self, request: &GenerationRequest) -> Result<String, CallFailure> {
        let body = CompletionRequest {
            model: &request.params.model,
            prompt: &request.prompt,
            temperature: request.params.temperature(),
            max_tokens: request.params.max_tokens,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CallFailure::Transient(e.to_string()))?;

        let status = response.status();
        if is_retryable_status(status) {
            let body = truncate_body(response.text().await.unwrap_or_default());
            return Err(CallFailure::Transient(format!("status {status}: {body}")));
        }
        if !status.is_success() {
            let body = truncate_body(response.text().await.unwrap_or_default());
            return Err(CallFailure::Fatal(UpstreamError::Status {
                status: status.as_u16(),
                body,
            }));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CallFailure::Transient(format!("malformed response: {e}")))?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .unwrap_or_default())
    }
}

/// Outcome classification for a single HTTP attempt.
enum CallFailure {
    /// Worth retrying with backoff
    Transient(String),
    /// Surfaced to the caller immediately
    Fatal(UpstreamError),
}

/// Statuses that indicate a transient provider condition.
fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Caps error bodies kept for logs and error messages.
///
/// Provider error bodies are arbitrary UTF-8, so the cut backs off to
/// the nearest char boundary.
fn truncate_body(body: String) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
