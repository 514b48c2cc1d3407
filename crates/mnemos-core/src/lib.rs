//! Business logic and repository trait definitions for Mnemos.
//!
//! This crate defines the "ports" (repository and LLM traits) that the
//! infrastructure layer implements, plus the memory registry, session arena
//! and capability dispatcher. It depends only on `mnemos-types` -- never on
//! `mnemos-infra` or any database/IO crate.

pub mod llm;
pub mod memory;
pub mod repository;
