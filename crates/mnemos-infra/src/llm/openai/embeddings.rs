//! OpenAI embeddings client (`POST /embeddings`).

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use mnemos_core::llm::embedder::Embedder;
use mnemos_types::llm::LlmError;

use super::config::OpenAiConfig;
use super::http;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedder backed by the OpenAI embeddings endpoint.
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        Ok(Self {
            http: http::build_client()?,
            config,
        })
    }

    fn build_body(&self, texts: &[String]) -> EmbeddingRequest<'_> {
        EmbeddingRequest {
            model: &self.config.embedding_model,
            input: texts.iter().map(|t| t.replace('\n', " ")).collect(),
        }
    }
}

impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .http
            .post(self.config.url("/embeddings"))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&self.build_body(texts))
            .send()
            .await
            .map_err(http::transport_error)?;
        let response = http::check(response).await?;

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse embeddings response: {e}"))
        })?;
        parse_response(texts.len(), parsed)
    }

    fn model_name(&self) -> &str {
        &self.config.embedding_model
    }
}

/// Put vectors back in input order. The API may return them shuffled, and a
/// short reply would silently misalign texts with vectors.
fn parse_response(expected: usize, mut response: EmbeddingResponse) -> Result<Vec<Vec<f32>>, LlmError> {
    if response.data.len() != expected {
        return Err(LlmError::Deserialization(format!(
            "expected {expected} embeddings, got {}",
            response.data.len()
        )));
    }
    response.data.sort_by_key(|d| d.index);
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_types::config::LlmConfig;

    fn make_embedder() -> OpenAiEmbedder {
        OpenAiEmbedder::new(OpenAiConfig::from_llm_config(&LlmConfig::default(), "sk-test")).unwrap()
    }

    #[test]
    fn test_body_replaces_newlines() {
        let embedder = make_embedder();
        let body = embedder.build_body(&["first line\nsecond line".to_string()]);
        assert_eq!(body.input, vec!["first line second line".to_string()]);
        assert_eq!(body.model, "text-embedding-3-large");
    }

    #[test]
    fn test_model_name() {
        assert_eq!(make_embedder().model_name(), "text-embedding-3-large");
    }

    #[tokio::test]
    async fn test_empty_input_skips_request() {
        let vectors = make_embedder().embed(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    fn response(json: &str) -> EmbeddingResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_vectors_restored_to_input_order() {
        let parsed = response(
            r#"{"data":[{"index":1,"embedding":[0.5]},{"index":0,"embedding":[0.25]}],"model":"m"}"#,
        );
        let vectors = parse_response(2, parsed).unwrap();
        assert_eq!(vectors, vec![vec![0.25], vec![0.5]]);
    }

    #[test]
    fn test_short_reply_is_rejected() {
        let parsed = response(r#"{"data":[{"index":0,"embedding":[0.25]}]}"#);
        let err = parse_response(3, parsed).unwrap_err();
        assert!(
            matches!(err, LlmError::Deserialization(ref msg) if msg == "expected 3 embeddings, got 1")
        );
    }
}
