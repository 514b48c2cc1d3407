//! LLM adapter ports: chat completion, embeddings, transcription and vision, plus the
//! retry wrapper and structured-output helper built on top of them.

pub mod boxed;
pub mod embedder;
pub mod provider;
pub mod retry;
pub mod structured;
pub mod transcriber;
pub mod vision;
