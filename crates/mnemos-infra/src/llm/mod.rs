//! LLM adapter implementations.
//!
//! Concrete implementations of the `LlmProvider`, `Embedder`, `Transcriber`
//! and `Vision` traits defined in `mnemos-core`, plus factories that build
//! them from the `[llm]` config section and wrap them in the retry policy.

pub mod openai;

use mnemos_core::llm::boxed::{BoxEmbedder, BoxLlmProvider};
use mnemos_core::llm::retry::{
    RetryPolicy, RetryingEmbedder, RetryingProvider, RetryingTranscriber, RetryingVision,
};
use mnemos_types::config::LlmConfig;
use mnemos_types::llm::LlmError;

use self::openai::config::OpenAiConfig;
use self::openai::embeddings::OpenAiEmbedder;
use self::openai::transcription::OpenAiTranscriber;
use self::openai::OpenAiProvider;

/// Environment variable the API key is read from.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Read the API key from the environment, treating an empty value as unset.
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty())
}

fn require_key(api_key: Option<&str>) -> Result<&str, LlmError> {
    api_key.ok_or(LlmError::AuthenticationFailed)
}

/// Create a retrying [`BoxLlmProvider`] from the `[llm]` config section.
///
/// # Errors
///
/// Returns `AuthenticationFailed` when no API key is available.
pub fn create_provider(config: &LlmConfig, api_key: Option<&str>) -> Result<BoxLlmProvider, LlmError> {
    let key = require_key(api_key)?;
    let provider = OpenAiProvider::new(OpenAiConfig::from_llm_config(config, key))?;
    Ok(BoxLlmProvider::new(RetryingProvider::new(
        provider,
        RetryPolicy::from_config(config),
    )))
}

/// Create a retrying [`BoxEmbedder`] from the `[llm]` config section.
pub fn create_embedder(config: &LlmConfig, api_key: Option<&str>) -> Result<BoxEmbedder, LlmError> {
    let key = require_key(api_key)?;
    let embedder = OpenAiEmbedder::new(OpenAiConfig::from_llm_config(config, key))?;
    Ok(BoxEmbedder::new(RetryingEmbedder::new(
        embedder,
        RetryPolicy::from_config(config),
    )))
}

/// Create a retrying transcriber from the `[llm]` config section.
pub fn create_transcriber(
    config: &LlmConfig,
    api_key: Option<&str>,
) -> Result<RetryingTranscriber<OpenAiTranscriber>, LlmError> {
    let key = require_key(api_key)?;
    let transcriber = OpenAiTranscriber::new(OpenAiConfig::from_llm_config(config, key))?;
    Ok(RetryingTranscriber::new(
        transcriber,
        RetryPolicy::from_config(config),
    ))
}

/// Create a retrying image describer from the `[llm]` config section.
pub fn create_vision(
    config: &LlmConfig,
    api_key: Option<&str>,
) -> Result<RetryingVision<OpenAiProvider>, LlmError> {
    let key = require_key(api_key)?;
    let provider = OpenAiProvider::new(OpenAiConfig::from_llm_config(config, key))?;
    Ok(RetryingVision::new(provider, RetryPolicy::from_config(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_requires_key() {
        let result = create_provider(&LlmConfig::default(), None);
        assert!(matches!(result, Err(LlmError::AuthenticationFailed)));
    }

    #[test]
    fn test_create_provider_with_key() {
        let provider = create_provider(&LlmConfig::default(), Some("sk-test")).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_create_embedder_uses_configured_model() {
        let config = LlmConfig {
            embedding_model: "text-embedding-3-small".to_string(),
            ..LlmConfig::default()
        };
        let embedder = create_embedder(&config, Some("sk-test")).unwrap();
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
    }

    #[test]
    fn test_create_transcriber_requires_key() {
        assert!(create_transcriber(&LlmConfig::default(), None).is_err());
        assert!(create_transcriber(&LlmConfig::default(), Some("sk-test")).is_ok());
    }

    #[tokio::test]
    async fn test_vision_missing_file_fails_without_retrying() {
        use mnemos_core::llm::vision::Vision;

        assert!(create_vision(&LlmConfig::default(), None).is_err());
        let config = LlmConfig {
            initial_backoff_ms: 60_000,
            ..LlmConfig::default()
        };
        let vision = create_vision(&config, Some("sk-test")).unwrap();
        // A retried FileNotFound would sleep for a minute before failing.
        let err = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            vision.describe_image(std::path::Path::new("/no/such/photo.jpg")),
        )
        .await
        .unwrap()
        .unwrap_err();
        assert!(matches!(err, LlmError::FileNotFound(_)));
    }
}
