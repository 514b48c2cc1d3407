//! Connection settings for the OpenAI adapter.

use secrecy::SecretString;

use mnemos_types::config::LlmConfig;

/// Everything the OpenAI clients need to talk to the API.
///
/// Does NOT derive Debug; the API key must never reach a log line.
pub struct OpenAiConfig {
    pub api_key: SecretString,
    /// Base URL without trailing slash (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub transcription_model: String,
    pub temperature: f64,
}

impl OpenAiConfig {
    /// Build adapter settings from the `[llm]` config section and a resolved key.
    pub fn from_llm_config(config: &LlmConfig, api_key: &str) -> Self {
        Self {
            api_key: SecretString::from(api_key.to_string()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            transcription_model: config.transcription_model.clone(),
            temperature: config.temperature,
        }
    }

    /// Full URL for an API path such as `/embeddings`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_from_llm_config_copies_models() {
        let config = OpenAiConfig::from_llm_config(&LlmConfig::default(), "sk-test");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.embedding_model, "text-embedding-3-large");
        assert_eq!(config.transcription_model, "whisper-1");
        assert_eq!(config.api_key.expose_secret(), "sk-test");
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let llm = LlmConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..LlmConfig::default()
        };
        let config = OpenAiConfig::from_llm_config(&llm, "sk-test");
        assert_eq!(config.url("/embeddings"), "http://localhost:8080/v1/embeddings");
    }
}
