//! Memory fragment types for Mnemos.
//!
//! Fragments are the stored observations behind the built-in memory
//! capabilities. They are partitioned by `(profile_id, namespace)`, so every
//! entity activated under the same namespace sees the same fragments.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::profile::ProfileId;

/// What produced a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    /// An observation stored through `add_memories`.
    Observation,
    /// Caller feedback stored through `provide_feedback`.
    Feedback,
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentKind::Observation => write!(f, "observation"),
            FragmentKind::Feedback => write!(f, "feedback"),
        }
    }
}

impl FromStr for FragmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "observation" => Ok(FragmentKind::Observation),
            "feedback" => Ok(FragmentKind::Feedback),
            other => Err(format!("invalid fragment kind: '{other}'")),
        }
    }
}

/// Retention tier a namespace has been initialised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTier {
    LongTerm,
    ShortTerm,
}

impl fmt::Display for MemoryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryTier::LongTerm => write!(f, "long_term"),
            MemoryTier::ShortTerm => write!(f, "short_term"),
        }
    }
}

impl FromStr for MemoryTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long_term" => Ok(MemoryTier::LongTerm),
            "short_term" => Ok(MemoryTier::ShortTerm),
            other => Err(format!("invalid memory tier: '{other}'")),
        }
    }
}

/// A single stored memory fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryFragment {
    pub id: Uuid,
    pub profile_id: ProfileId,
    pub namespace: String,
    pub content: String,
    /// Caller-supplied parameters recorded alongside the observation.
    pub metadata: serde_json::Value,
    /// Empty for fragments that were never embedded (feedback).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
    pub kind: FragmentKind,
    /// For feedback: the fragment the feedback is about.
    pub related_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A fragment returned from a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredFragment {
    pub fragment: MemoryFragment,
    /// Cosine similarity to the query, in [-1.0, 1.0].
    pub score: f32,
}

/// Structured context assembled by the `build_context` capability.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BufferContext {
    /// Short summary of what memory knows that bears on the observation.
    pub summary: String,
    /// Individual facts from memory that are relevant, most relevant first.
    pub relevant_facts: Vec<String>,
}

/// One step proposed by the `run_cycle` capability.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskStep {
    pub order: u32,
    pub description: String,
}

/// Structured plan produced by the `run_cycle` capability.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskList {
    pub answer: String,
    pub steps: Vec<TaskStep>,
}
