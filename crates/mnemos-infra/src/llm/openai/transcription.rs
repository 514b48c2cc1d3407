//! OpenAI audio transcription client (`POST /audio/transcriptions`).

use std::path::Path;

use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::Deserialize;

use mnemos_core::llm::transcriber::Transcriber;
use mnemos_types::llm::LlmError;

use super::config::OpenAiConfig;
use super::http;

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub struct OpenAiTranscriber {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiTranscriber {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        Ok(Self {
            http: http::build_client()?,
            config,
        })
    }
}

impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, path: &Path) -> Result<String, LlmError> {
        let bytes = read_existing(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let form = Form::new()
            .text("model", self.config.transcription_model.clone())
            .part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .http
            .post(self.config.url("/audio/transcriptions"))
            .bearer_auth(self.config.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(http::transport_error)?;
        let response = http::check(response).await?;

        let parsed: TranscriptionResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse transcription response: {e}"))
        })?;
        tracing::debug!(path = %path.display(), chars = parsed.text.len(), "audio transcribed");
        Ok(parsed.text)
    }
}

/// Read a local file, reporting a missing one as `FileNotFound` before any network call.
pub(crate) async fn read_existing(path: &Path) -> Result<Vec<u8>, LlmError> {
    if !path.is_file() {
        return Err(LlmError::FileNotFound(path.display().to_string()));
    }
    tokio::fs::read(path).await.map_err(|e| LlmError::InvalidRequest(format!(
        "failed to read {}: {e}",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_types::config::LlmConfig;

    #[tokio::test]
    async fn test_missing_file_fails_before_request() {
        let transcriber =
            OpenAiTranscriber::new(OpenAiConfig::from_llm_config(&LlmConfig::default(), "sk-test"))
                .unwrap();
        let err = transcriber
            .transcribe(Path::new("/definitely/not/here.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::FileNotFound(ref p) if p.ends_with("here.mp3")));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_read_existing_returns_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        std::fs::write(&path, b"RIFF").unwrap();
        assert_eq!(read_existing(&path).await.unwrap(), b"RIFF".to_vec());
    }

    #[tokio::test]
    async fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_existing(dir.path()).await.unwrap_err();
        assert!(matches!(err, LlmError::FileNotFound(_)));
    }
}
