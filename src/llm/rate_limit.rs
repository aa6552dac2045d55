//! Request-rate limiting for LLM calls.
//!
//! A token bucket refilled at a fixed rate. The bucket starts empty and holds
//! at most `max_bucket_size` tokens, so bursts are bounded. Callers that find
//! the bucket empty wait and poll again instead of failing.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::client::{LlmClient, LlmError};
use crate::error::{AgentError, Result};
use super::types::{CompletionRequest, CompletionResponse};

/// Rate limit configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Tokens added to the bucket per second.
    pub requests_per_second: f64,
    /// Polling interval while waiting for a token.
    pub check_every: Duration,
    /// Maximum number of tokens the bucket can hold.
    pub max_bucket_size: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 9.0 / 60.0,
            check_every: Duration::from_secs(1),
            max_bucket_size: 9.0,
        }
    }
}

impl RateLimitConfig {
    /// Reject settings under which the bucket never holds a whole token.
    pub fn validate(&self) -> Result<()> {
        if self.requests_per_second.is_nan() || self.requests_per_second <= 0.0 {
            return Err(AgentError::Config(format!(
                "rate_limit.requests_per_second must be positive, got {}",
                self.requests_per_second
            )));
        }
        if self.max_bucket_size.is_nan() || self.max_bucket_size < 1.0 {
            return Err(AgentError::Config(format!(
                "rate_limit.max_bucket_size must be at least 1, got {}",
                self.max_bucket_size
            )));
        }
        if self.check_every.is_zero() {
            return Err(AgentError::Config("rate_limit.check_every_ms must be non-zero".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct BucketState {
    available_tokens: f64,
    last_refill: Option<Instant>,
}

/// Token bucket shared by every reasoning call.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BucketState {
                available_tokens: 0.0,
                last_refill: None,
            }),
        }
    }

    /// Try to take one token without waiting.
    pub fn try_acquire(&self) -> bool {
        // A panic elsewhere leaves the counters themselves intact
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let now = Instant::now();
        let last = *state.last_refill.get_or_insert(now);

        let refill = now.duration_since(last).as_secs_f64() * self.config.requests_per_second;
        if refill >= 1.0 {
            state.available_tokens = (state.available_tokens + refill).min(self.config.max_bucket_size);
            state.last_refill = Some(now);
        }

        if state.available_tokens >= 1.0 {
            state.available_tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Wait until a token is available, then take it.
    pub async fn acquire(&self) {
        let started = Instant::now();
        while !self.try_acquire() {
            tokio::time::sleep(self.config.check_every).await;
        }

        let waited = started.elapsed();
        if !waited.is_zero() {
            log::debug!("Rate limiter released after waiting {:?}", waited);
        }
    }

    /// Tokens currently in the bucket (without refilling).
    pub fn available(&self) -> f64 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).available_tokens
    }
}

/// Wraps an [`LlmClient`] so every completion first takes a token.
pub struct RateLimitedClient<C: LlmClient> {
    inner: C,
    limiter: RateLimiter,
}

impl<C: LlmClient> RateLimitedClient<C> {
    pub fn new(inner: C, limiter: RateLimiter) -> Self {
        Self { inner, limiter }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: LlmClient> LlmClient for RateLimitedClient<C> {
    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, LlmError> {
        self.limiter.acquire().await;
        self.inner.complete(request).await
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}
