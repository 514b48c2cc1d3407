//! Transcriber trait for speech-to-text.

use std::path::Path;

use mnemos_types::llm::LlmError;

/// Trait for audio transcription backends.
///
/// Implementations must return `LlmError::FileNotFound` before making any
/// network call when `path` does not exist.
pub trait Transcriber: Send + Sync {
    fn transcribe(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;
}
