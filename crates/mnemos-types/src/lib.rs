//! Shared domain types for Mnemos.
//!
//! This crate contains the core domain types used across the Mnemos workspace:
//! owners and their memory profiles, per-entity capability sets, memory
//! fragments, LLM request shapes, taxonomy data models, and error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, schemars.

pub mod capability;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod profile;
pub mod taxonomy;
