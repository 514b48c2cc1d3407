//! Retry wrappers for the LLM adapter.
//!
//! Every network-backed call (completion, embedding, transcription, image
//! description) is retried
//! up to `max_attempts` times with exponential backoff. Errors that cannot be
//! fixed by resending the same request (`LlmError::is_retryable() == false`)
//! are returned immediately.

use std::future::Future;
use std::time::Duration;

use mnemos_types::config::LlmConfig;
use mnemos_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::embedder::Embedder;
use super::provider::LlmProvider;
use super::transcriber::Transcriber;
use super::vision::Vision;

/// Upper bound on a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(20);

/// How many times to try a call and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: MAX_BACKOFF,
        }
    }

    /// Delay before retry number `attempt` (1-based: the wait after the first failure is `attempt = 1`).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// The delay to use after `error`, honouring a provider's retry-after hint.
    fn delay_after(&self, attempt: u32, error: &LlmError) -> Duration {
        let backoff = self.backoff(attempt);
        match error {
            LlmError::RateLimited {
                retry_after_ms: Some(ms),
            } => backoff.max(Duration::from_millis(*ms)),
            _ => backoff,
        }
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. The last error is returned.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() || attempt >= max_attempts => {
                    if attempt > 1 {
                        tracing::error!(operation, attempt, error = %e, "LLM call failed, giving up");
                    }
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_after(attempt, &e);
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "LLM call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Provider decorator that applies a `RetryPolicy` to every completion.
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: LlmProvider> RetryingProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<P: LlmProvider> LlmProvider for RetryingProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.policy
            .run("complete", || self.inner.complete(request))
            .await
    }
}

/// Embedder decorator that applies a `RetryPolicy` to every batch.
pub struct RetryingEmbedder<E> {
    inner: E,
    policy: RetryPolicy,
}

impl<E: Embedder> RetryingEmbedder<E> {
    pub fn new(inner: E, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<E: Embedder> Embedder for RetryingEmbedder<E> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        self.policy.run("embed", || self.inner.embed(texts)).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Transcriber decorator. A missing file is not retried.
pub struct RetryingTranscriber<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Transcriber> RetryingTranscriber<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T: Transcriber> Transcriber for RetryingTranscriber<T> {
    async fn transcribe(&self, path: &std::path::Path) -> Result<String, LlmError> {
        self.policy
            .run("transcribe", || self.inner.transcribe(path))
            .await
    }
}

/// Vision decorator. Like transcription, a missing file fails on the first try.
pub struct RetryingVision<V> {
    inner: V,
    policy: RetryPolicy,
}

impl<V: Vision> RetryingVision<V> {
    pub fn new(inner: V, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<V: Vision> Vision for RetryingVision<V> {
    async fn describe_image(&self, path: &std::path::Path) -> Result<String, LlmError> {
        self.policy
            .run("describe_image", || self.inner.describe_image(path))
            .await
    }
}
