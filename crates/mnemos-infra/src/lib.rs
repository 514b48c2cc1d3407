//! Infrastructure layer for Mnemos.
//!
//! Contains implementations of the ports defined in `mnemos-core`: SQLite
//! storage for profiles and fragments, the OpenAI adapter for chat,
//! embeddings, transcription and vision, and the config-file loader.

pub mod config;
pub mod llm;
pub mod sqlite;
