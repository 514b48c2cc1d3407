//! Vision trait for image description.

use std::path::Path;

use mnemos_types::llm::LlmError;

/// Trait for backends that describe the contents of an image file.
///
/// Like [`Transcriber`](super::transcriber::Transcriber), a missing file is
/// reported as `LlmError::FileNotFound` before any network call.
pub trait Vision: Send + Sync {
    fn describe_image(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;
}
