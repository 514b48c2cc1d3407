//! Structured output over a plain chat completion.
//!
//! The caller names a Rust type; its JSON schema (via schemars) is appended to
//! the system prompt and the reply is parsed back into that type. Models often
//! wrap JSON in a fenced code block, so fences are stripped before parsing.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use mnemos_types::llm::{CompletionRequest, LlmError, Message};

use super::provider::LlmProvider;

/// Placeholder substituted for an empty user input in prompt previews.
pub const EMPTY_INPUT_PLACEHOLDER: &str = "No user input provided.";

const STRUCTURED_MAX_TOKENS: u32 = 2048;

/// Stateless helper for schema-constrained LLM calls.
pub struct StructuredOutput;

impl StructuredOutput {
    /// Ask the provider to extract a `T` from `text_input`.
    #[tracing::instrument(
        name = "structured_output",
        skip(provider, text_input, system_prompt),
        fields(provider = provider.name(), output_type = std::any::type_name::<T>())
    )]
    pub async fn generate<T, P>(
        provider: &P,
        text_input: &str,
        system_prompt: &str,
    ) -> Result<T, LlmError>
    where
        T: JsonSchema + DeserializeOwned,
        P: LlmProvider,
    {
        let request = Self::build_request::<T>(text_input, system_prompt)?;
        let response = provider.complete(&request).await?;
        Self::parse_reply(&response.content)
    }

    /// Build the completion request for `T` without sending it.
    pub fn build_request<T: JsonSchema>(
        text_input: &str,
        system_prompt: &str,
    ) -> Result<CompletionRequest, LlmError> {
        let schema = serde_json::to_string_pretty(&schemars::schema_for!(T))
            .map_err(|e| LlmError::InvalidRequest(format!("unserializable schema: {e}")))?;

        let system = format!(
            "{system_prompt}\n\n\
             Respond with a single JSON object that conforms to this JSON schema:\n\
             {schema}\n\
             Return only the JSON object, with no commentary."
        );

        Ok(CompletionRequest {
            model: String::new(),
            messages: vec![Message::user(format!(
                "Use the given format to extract information from the following input: {text_input}."
            ))],
            system: Some(system),
            max_tokens: STRUCTURED_MAX_TOKENS,
            temperature: None,
        })
    }

    /// Parse a model reply into `T`, tolerating a surrounding code fence.
    pub fn parse_reply<T: DeserializeOwned>(content: &str) -> Result<T, LlmError> {
        let json = strip_code_fence(content);
        serde_json::from_str(json).map_err(|e| {
            tracing::warn!(
                error = %e,
                content_preview = preview(json, 200),
                "Structured output did not match the requested schema"
            );
            LlmError::Deserialization(e.to_string())
        })
    }
}

/// Format the prompt pair the way it is sent, for display and debugging.
///
/// An empty `system_prompt` is an error; an empty `text_input` is replaced by
/// a placeholder.
pub fn render_prompt(text_input: &str, system_prompt: &str) -> Result<String, LlmError> {
    if system_prompt.trim().is_empty() {
        return Err(LlmError::MissingSystemPrompt);
    }
    let text_input = if text_input.is_empty() {
        EMPTY_INPUT_PLACEHOLDER
    } else {
        text_input
    };
    Ok(format!(
        "System Prompt:\n{system_prompt}\n\nUser Input:\n{text_input}\n"
    ))
}

fn preview(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(idx, _)| &text[..idx])
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line (```json).
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
