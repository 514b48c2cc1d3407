//! Global configuration types for Mnemos.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the LLM
//! adapter (models, retry policy) and memory defaults.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from `~/.mnemos/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub memory: MemoryConfig,
}

/// LLM adapter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub temperature: f64,

    /// Total attempts per call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-large".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    500
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            embedding_model: default_embedding_model(),
            transcription_model: default_transcription_model(),
            base_url: default_base_url(),
            temperature: 0.0,
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

/// Memory subsystem defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// How many fragments `fetch_memories` returns when no limit is given.
    #[serde(default = "default_fetch_limit")]
    pub default_fetch_limit: usize,

    #[serde(default)]
    pub index_name: Option<String>,

    #[serde(default = "default_db_type")]
    pub db_type: String,
}

fn default_fetch_limit() -> usize {
    5
}

fn default_db_type() -> String {
    "sqlite".to_string()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            default_fetch_limit: default_fetch_limit(),
            index_name: None,
            db_type: default_db_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_attempts, 5);
        assert_eq!(config.memory.default_fetch_limit, 5);
        assert_eq!(config.memory.db_type, "sqlite");
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.llm.embedding_model, "text-embedding-3-large");
        assert_eq!(config.llm.transcription_model, "whisper-1");
        assert!(config.memory.index_name.is_none());
    }

    #[test]
    fn test_global_config_deserialize_partial_sections() {
        let toml_str = r#"
[llm]
model = "gpt-4o"
max_attempts = 3

[memory]
default_fetch_limit = 10
index_name = "research"
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.max_attempts, 3);
        assert_eq!(config.llm.initial_backoff_ms, 500);
        assert_eq!(config.memory.default_fetch_limit, 10);
        assert_eq!(config.memory.index_name.as_deref(), Some("research"));
    }
}
