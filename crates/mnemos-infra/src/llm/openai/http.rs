//! Shared HTTP plumbing for the reqwest-based OpenAI endpoints.

use std::time::Duration;

use mnemos_types::llm::LlmError;

/// Build the reqwest client used for embeddings, audio and vision calls.
pub(crate) fn build_client() -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .map_err(|e| LlmError::Provider {
            message: format!("failed to create HTTP client: {e}"),
        })
}

/// Map a non-success HTTP status to an [`LlmError`].
///
/// `retry_after` is the raw `retry-after` header in seconds, if present.
pub(crate) fn map_status(status: u16, retry_after: Option<&str>, body: String) -> LlmError {
    match status {
        400 | 404 | 413 | 422 => LlmError::InvalidRequest(body),
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000)),
        },
        502 | 503 | 529 => LlmError::Overloaded(body),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

/// Check a response and turn failures into [`LlmError`]s.
pub(crate) async fn check(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    Err(map_status(status.as_u16(), retry_after.as_deref(), body))
}

pub(crate) fn transport_error(err: reqwest::Error) -> LlmError {
    LlmError::Provider {
        message: format!("HTTP request failed: {err}"),
    }
}
