//! Type-erased LLM collaborators.
//!
//! `LlmProvider` and `Embedder` return `impl Future`, so they cannot be
//! trait objects. Each gets a private object-safe mirror with a blanket impl,
//! and a `Box*` wrapper that the memory backend stores without generics.

use std::future::Future;
use std::pin::Pin;

use mnemos_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::embedder::Embedder;
use super::provider::LlmProvider;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LlmError>> + Send + 'a>>;

trait ErasedProvider: Send + Sync {
    fn provider_name(&self) -> &str;
    fn complete_erased<'a>(&'a self, request: &'a CompletionRequest) -> BoxFuture<'a, CompletionResponse>;
}

impl<P: LlmProvider> ErasedProvider for P {
    fn provider_name(&self) -> &str {
        self.name()
    }

    fn complete_erased<'a>(&'a self, request: &'a CompletionRequest) -> BoxFuture<'a, CompletionResponse> {
        Box::pin(self.complete(request))
    }
}

/// A chat provider chosen at runtime.
pub struct BoxLlmProvider(Box<dyn ErasedProvider>);

impl BoxLlmProvider {
    pub fn new<P: LlmProvider + 'static>(provider: P) -> Self {
        Self(Box::new(provider))
    }

    pub fn name(&self) -> &str {
        self.0.provider_name()
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.0.complete_erased(request).await
    }
}

/// Lets a boxed provider flow into generic helpers like `StructuredOutput`.
impl LlmProvider for BoxLlmProvider {
    fn name(&self) -> &str {
        self.0.provider_name()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.0.complete_erased(request).await
    }
}

trait ErasedEmbedder: Send + Sync {
    fn embedder_model(&self) -> &str;
    fn embed_erased<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Vec<Vec<f32>>>;
}

impl<E: Embedder> ErasedEmbedder for E {
    fn embedder_model(&self) -> &str {
        self.model_name()
    }

    fn embed_erased<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Vec<Vec<f32>>> {
        Box::pin(self.embed(texts))
    }
}

/// An embedder chosen at runtime.
pub struct BoxEmbedder(Box<dyn ErasedEmbedder>);

impl BoxEmbedder {
    pub fn new<E: Embedder + 'static>(embedder: E) -> Self {
        Self(Box::new(embedder))
    }

    /// One vector per input, in input order.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        self.0.embed_erased(texts).await
    }

    /// Embed a single text. An empty reply is a deserialization error.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| LlmError::Deserialization("embedding response contained no vectors".into()))
    }

    pub fn model_name(&self) -> &str {
        self.0.embedder_model()
    }
}
