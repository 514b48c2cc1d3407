//! OpenAI adapter.
//!
//! Chat completions go through [`async_openai`]; embeddings, transcription
//! and image description are plain reqwest calls against the same base URL.

pub mod config;
pub mod embeddings;
mod http;
pub mod transcription;

use std::path::Path;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest, FinishReason,
};
use base64::Engine;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;

use mnemos_core::llm::provider::LlmProvider;
use mnemos_core::llm::vision::Vision;
use mnemos_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, Message, MessageRole, StopReason, Usage,
};

use self::config::OpenAiConfig;

const IMAGE_PROMPT: &str = "What's in this image?";
const IMAGE_MAX_TOKENS: u32 = 300;

/// Chat-completion provider for the OpenAI API (or any compatible base URL).
///
/// Does NOT derive Debug: the async-openai client holds the API key.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.expose_secret())
            .with_api_base(&config.base_url);

        Ok(Self {
            client: Client::with_config(openai_config),
            http: http::build_client()?,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Translate a provider-neutral request. An empty `model` or a missing
    /// temperature falls back to the configured value.
    fn build_request(&self, request: &CompletionRequest) -> CreateChatCompletionRequest {
        let leading_system = request
            .system
            .as_deref()
            .map(|text| to_openai_message(&Message::system(text)));
        let messages = leading_system
            .into_iter()
            .chain(request.messages.iter().map(to_openai_message))
            .collect();

        let model = Some(request.model.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or(self.config.model.as_str())
            .to_string();
        let temperature = request.temperature.unwrap_or(self.config.temperature);

        CreateChatCompletionRequest {
            model,
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: Some(temperature as f32),
            ..Default::default()
        }
    }

}

/// Asks the chat model what an image contains. The file is inlined as a
/// base64 JPEG data URL.
impl Vision for OpenAiProvider {
    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    async fn describe_image(&self, path: &Path) -> Result<String, LlmError> {
        let bytes = transcription::read_existing(path).await?;
        let body = image_request_body(&self.config.model, &bytes);

        let response = self
            .http
            .post(self.config.url("/chat/completions"))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(http::transport_error)?;
        let response = http::check(response).await?;

        let parsed: VisionResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse vision response: {e}"))
        })?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self
            .client
            .chat()
            .create(self.build_request(request))
            .await
            .map_err(map_openai_error)?;

        let (content, finish) = response
            .choices
            .into_iter()
            .next()
            .map(|choice| (choice.message.content.unwrap_or_default(), choice.finish_reason))
            .unwrap_or_default();

        let usage = response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            id: response.id,
            content,
            model: response.model,
            stop_reason: stop_reason(finish.as_ref()),
            usage,
        })
    }
}

fn to_openai_message(message: &Message) -> ChatCompletionRequestMessage {
    let text = message.content.clone();
    match message.role {
        MessageRole::System => {
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(text),
                name: None,
            })
        }
        MessageRole::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(text),
            name: None,
        }),
        MessageRole::Assistant => {
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: Some(ChatCompletionRequestAssistantMessageContent::Text(text)),
                ..Default::default()
            })
        }
    }
}

fn stop_reason(finish: Option<&FinishReason>) -> StopReason {
    match finish {
        Some(FinishReason::Length) => StopReason::MaxTokens,
        Some(FinishReason::ContentFilter) => StopReason::ContentFilter,
        _ => StopReason::EndTurn,
    }
}

fn image_request_body(model: &str, image: &[u8]) -> serde_json::Value {
    let encoded = base64::engine::general_purpose::STANDARD.encode(image);
    json!({
        "model": model,
        "max_tokens": IMAGE_MAX_TOKENS,
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": IMAGE_PROMPT },
                {
                    "type": "image_url",
                    "image_url": { "url": format!("data:image/jpeg;base64,{encoded}") }
                }
            ]
        }]
    })
}

#[derive(Deserialize)]
struct VisionResponse {
    choices: Vec<VisionChoice>,
}

#[derive(Deserialize)]
struct VisionChoice {
    message: VisionMessage,
}

#[derive(Deserialize)]
struct VisionMessage {
    content: Option<String>,
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else if code == "context_length_exceeded" || error_type == "invalid_request_error" {
                LlmError::InvalidRequest(api_err.message.clone())
            } else if code == "server_error" || error_type == "overloaded_error" {
                LlmError::Overloaded(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status() {
            Some(status) => http::map_status(status.as_u16(), None, err.to_string()),
            None => LlmError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_types::config::LlmConfig;

    fn make_provider() -> OpenAiProvider {
        OpenAiProvider::new(OpenAiConfig::from_llm_config(&LlmConfig::default(), "sk-test")).unwrap()
    }

    #[test]
    fn test_provider_name_and_model() {
        let provider = make_provider();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_build_request_messages() {
        let provider = make_provider();
        let request = CompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![
                Message::user("Hello"),
                Message::assistant("Hi there!"),
            ],
            system: Some("Be helpful".to_string()),
            max_tokens: 1024,
            temperature: Some(0.7),
        };

        let oai_req = provider.build_request(&request);
        assert_eq!(oai_req.model, "gpt-4o");
        assert_eq!(oai_req.messages.len(), 3);
        assert_eq!(oai_req.max_completion_tokens, Some(1024));
        assert!(oai_req.stream.is_none());
    }

    #[test]
    fn test_build_request_defaults_model_and_temperature() {
        let provider = make_provider();
        let request = CompletionRequest {
            model: String::new(),
            messages: vec![],
            system: None,
            max_tokens: 256,
            temperature: None,
        };

        let oai_req = provider.build_request(&request);
        assert_eq!(oai_req.model, "gpt-4o-mini");
        assert_eq!(oai_req.temperature, Some(0.0));
        assert!(oai_req.messages.is_empty());
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(stop_reason(Some(&FinishReason::Length)), StopReason::MaxTokens);
        assert_eq!(
            stop_reason(Some(&FinishReason::ContentFilter)),
            StopReason::ContentFilter
        );
        assert_eq!(stop_reason(Some(&FinishReason::ToolCalls)), StopReason::EndTurn);
        assert_eq!(stop_reason(None), StopReason::EndTurn);
    }

    #[test]
    fn test_image_request_body() {
        let body = image_request_body("gpt-4o-mini", b"abc");
        assert_eq!(body["max_tokens"], 300);
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["text"], IMAGE_PROMPT);
        assert_eq!(content[1]["image_url"]["url"], "data:image/jpeg;base64,YWJj");
    }

    #[tokio::test]
    async fn test_describe_missing_image() {
        let err = make_provider()
            .describe_image(Path::new("/no/such/picture.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::FileNotFound(_)));
    }

    #[test]
    fn test_map_openai_error_api_auth() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Incorrect API key provided".to_string(),
            r#type: Some("invalid_request_error".to_string()),
            param: None,
            code: Some("invalid_api_key".to_string()),
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::AuthenticationFailed));
    }

    #[test]
    fn test_map_openai_error_rate_limit() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Rate limit reached".to_string(),
            r#type: Some("requests".to_string()),
            param: None,
            code: Some("rate_limit_exceeded".to_string()),
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::RateLimited { .. }));
    }

    #[test]
    fn test_map_openai_error_invalid_argument() {
        use async_openai::error::OpenAIError;
        let err = map_openai_error(OpenAIError::InvalidArgument("bad arg".to_string()));
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }
}
