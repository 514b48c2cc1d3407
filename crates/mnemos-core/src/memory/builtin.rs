//! Built-in memory capabilities.
//!
//! Every name in the default capability vocabulary is bound here to an
//! implementation over a `FragmentRepository`, an embedder and (for the
//! capabilities that reason over memory) an LLM provider. Fragments are
//! partitioned by `(profile_id, namespace)`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use mnemos_types::memory::{
    BufferContext, FragmentKind, MemoryFragment, MemoryTier, ScoredFragment, TaskList,
};

use crate::llm::boxed::{BoxEmbedder, BoxLlmProvider};
use crate::llm::embedder::cosine_similarity;
use crate::llm::structured::StructuredOutput;
use crate::repository::fragment::FragmentRepository;

use super::handler::{CapabilityError, CapabilityHandler, CapabilityTable, InvocationContext};

const CONTEXT_SYSTEM_PROMPT: &str = "You are the working memory of an assistant. \
Given an observation and the memories retrieved for it, summarise what the memories \
say that bears on the observation and list the individual relevant facts, most \
relevant first. Use only the memories provided; if none are relevant, say so in the \
summary and return an empty list of facts.";

const CYCLE_SYSTEM_PROMPT: &str = "You are the planning step of an assistant's memory \
cycle. Given an observation and the context assembled from memory, answer the \
observation as well as the context allows and propose the ordered steps that \
should be taken next.";

// ---------------------------------------------------------------------------
// MemoryOperation
// ---------------------------------------------------------------------------

/// The closed set of built-in operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryOperation {
    CreateLongTerm,
    CreateShortTerm,
    AddMemories,
    FetchMemories,
    DeleteMemories,
    BuildContext,
    RunCycle,
    ListOperations,
    ProvideFeedback,
}

impl MemoryOperation {
    pub const ALL: [MemoryOperation; 9] = [
        MemoryOperation::CreateLongTerm,
        MemoryOperation::CreateShortTerm,
        MemoryOperation::AddMemories,
        MemoryOperation::FetchMemories,
        MemoryOperation::DeleteMemories,
        MemoryOperation::BuildContext,
        MemoryOperation::RunCycle,
        MemoryOperation::ListOperations,
        MemoryOperation::ProvideFeedback,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MemoryOperation::CreateLongTerm => "create_long_term",
            MemoryOperation::CreateShortTerm => "create_short_term",
            MemoryOperation::AddMemories => "add_memories",
            MemoryOperation::FetchMemories => "fetch_memories",
            MemoryOperation::DeleteMemories => "delete_memories",
            MemoryOperation::BuildContext => "build_context",
            MemoryOperation::RunCycle => "run_cycle",
            MemoryOperation::ListOperations => "list_operations",
            MemoryOperation::ProvideFeedback => "provide_feedback",
        }
    }
}

impl fmt::Display for MemoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MemoryOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemoryOperation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| format!("unknown memory operation: '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AddArgs {
    observation: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct FetchArgs {
    observation: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct DeleteArgs {
    #[serde(default)]
    id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct FeedbackArgs {
    feedback: String,
    #[serde(default)]
    fragment_id: Option<Uuid>,
}

fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, CapabilityError> {
    serde_json::from_value(args).map_err(|e| CapabilityError::InvalidArguments(e.to_string()))
}

/// Like `parse_args`, but a missing argument object means "all defaults".
fn parse_optional_args<T: serde::de::DeserializeOwned + Default>(
    args: Value,
) -> Result<T, CapabilityError> {
    if args.is_null() {
        return Ok(T::default());
    }
    parse_args(args)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, CapabilityError> {
    serde_json::to_value(value).map_err(|e| CapabilityError::InvalidArguments(e.to_string()))
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// Collaborators shared by every built-in capability.
pub struct MemoryBackend<R> {
    repo: R,
    embedder: BoxEmbedder,
    llm: Option<BoxLlmProvider>,
    default_fetch_limit: usize,
}

impl<R: FragmentRepository> MemoryBackend<R> {
    pub fn new(repo: R, embedder: BoxEmbedder, default_fetch_limit: usize) -> Self {
        Self {
            repo,
            embedder,
            llm: None,
            default_fetch_limit,
        }
    }

    /// Enable `build_context` and `run_cycle`.
    pub fn with_llm(mut self, llm: BoxLlmProvider) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    fn llm(&self, operation: MemoryOperation) -> Result<&BoxLlmProvider, CapabilityError> {
        self.llm.as_ref().ok_or_else(|| {
            CapabilityError::Unavailable(format!("{operation} needs an LLM provider"))
        })
    }

    async fn create_tier(
        &self,
        ctx: &InvocationContext,
        tier: MemoryTier,
    ) -> Result<Value, CapabilityError> {
        let created = self
            .repo
            .ensure_namespace(&ctx.profile_id, &ctx.namespace, tier)
            .await?;
        Ok(json!({ "namespace": ctx.namespace, "tier": tier, "created": created }))
    }

    async fn add(&self, ctx: &InvocationContext, args: AddArgs) -> Result<Value, CapabilityError> {
        let embedding = self.embedder.embed_one(&args.observation).await?;
        let fragment = MemoryFragment {
            id: Uuid::now_v7(),
            profile_id: ctx.profile_id.clone(),
            namespace: ctx.namespace.clone(),
            content: args.observation,
            metadata: args.params.unwrap_or_else(|| json!({})),
            embedding,
            kind: FragmentKind::Observation,
            related_to: None,
            created_at: Utc::now(),
        };
        self.repo.save(&fragment).await?;
        tracing::debug!(fragment_id = %fragment.id, namespace = %ctx.namespace, "Stored memory");
        Ok(json!({ "id": fragment.id }))
    }

    /// Rank the namespace's embedded fragments against `query`.
    ///
    /// Highest similarity first; equal scores fall back to newest first.
    async fn search(
        &self,
        ctx: &InvocationContext,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredFragment>, CapabilityError> {
        let query_vector = self.embedder.embed_one(query).await?;
        let fragments = self
            .repo
            .list_namespace(&ctx.profile_id, &ctx.namespace)
            .await?;

        let mut scored: Vec<ScoredFragment> = fragments
            .into_iter()
            .filter(|f| !f.embedding.is_empty())
            .map(|fragment| ScoredFragment {
                score: cosine_similarity(&query_vector, &fragment.embedding),
                fragment,
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.fragment.created_at.cmp(&a.fragment.created_at))
        });
        scored.truncate(limit.unwrap_or(self.default_fetch_limit));
        Ok(scored)
    }

    async fn delete(
        &self,
        ctx: &InvocationContext,
        args: DeleteArgs,
    ) -> Result<Value, CapabilityError> {
        let deleted = match args.id {
            Some(id) => u64::from(self.repo.delete(&ctx.profile_id, &ctx.namespace, &id).await?),
            None => {
                self.repo
                    .delete_namespace(&ctx.profile_id, &ctx.namespace)
                    .await?
            }
        };
        tracing::debug!(deleted, namespace = %ctx.namespace, "Deleted memories");
        Ok(json!({ "deleted": deleted }))
    }

    async fn build_context(
        &self,
        ctx: &InvocationContext,
        args: FetchArgs,
    ) -> Result<BufferContext, CapabilityError> {
        let llm = self.llm(MemoryOperation::BuildContext)?;
        let memories = self.search(ctx, &args.observation, args.limit).await?;

        let mut input = format!("Observation: {}\n\nRetrieved memories:\n", args.observation);
        if memories.is_empty() {
            input.push_str("(none)\n");
        }
        for memory in &memories {
            input.push_str(&format!("- {}\n", memory.fragment.content));
        }

        Ok(StructuredOutput::generate(llm, &input, CONTEXT_SYSTEM_PROMPT).await?)
    }

    async fn run_cycle(
        &self,
        ctx: &InvocationContext,
        args: FetchArgs,
    ) -> Result<Value, CapabilityError> {
        let llm = self.llm(MemoryOperation::RunCycle)?;
        let observation = args.observation.clone();
        let context = self.build_context(ctx, args).await?;

        let mut input = format!(
            "Observation: {observation}\n\nContext summary: {}\n\nRelevant facts:\n",
            context.summary
        );
        for fact in &context.relevant_facts {
            input.push_str(&format!("- {fact}\n"));
        }

        let tasks: TaskList = StructuredOutput::generate(llm, &input, CYCLE_SYSTEM_PROMPT).await?;
        Ok(json!({ "context": to_json(&context)?, "tasks": to_json(&tasks)? }))
    }

    async fn feedback(
        &self,
        ctx: &InvocationContext,
        args: FeedbackArgs,
    ) -> Result<Value, CapabilityError> {
        let fragment = MemoryFragment {
            id: Uuid::now_v7(),
            profile_id: ctx.profile_id.clone(),
            namespace: ctx.namespace.clone(),
            content: args.feedback,
            metadata: json!({}),
            embedding: Vec::new(),
            kind: FragmentKind::Feedback,
            related_to: args.fragment_id,
            created_at: Utc::now(),
        };
        self.repo.save(&fragment).await?;
        Ok(json!({ "id": fragment.id }))
    }

    async fn run(
        &self,
        operation: MemoryOperation,
        ctx: InvocationContext,
        args: Value,
    ) -> Result<Value, CapabilityError> {
        match operation {
            MemoryOperation::CreateLongTerm => self.create_tier(&ctx, MemoryTier::LongTerm).await,
            MemoryOperation::CreateShortTerm => self.create_tier(&ctx, MemoryTier::ShortTerm).await,
            MemoryOperation::AddMemories => self.add(&ctx, parse_args(args)?).await,
            MemoryOperation::FetchMemories => {
                let args: FetchArgs = parse_args(args)?;
                let mut results = self.search(&ctx, &args.observation, args.limit).await?;
                for result in &mut results {
                    result.fragment.embedding.clear();
                }
                to_json(&results)
            }
            MemoryOperation::DeleteMemories => self.delete(&ctx, parse_optional_args(args)?).await,
            MemoryOperation::BuildContext => {
                let context = self.build_context(&ctx, parse_args(args)?).await?;
                to_json(&context)
            }
            MemoryOperation::RunCycle => self.run_cycle(&ctx, parse_args(args)?).await,
            MemoryOperation::ListOperations => Ok(json!({ "operations": ctx.available_operations })),
            MemoryOperation::ProvideFeedback => self.feedback(&ctx, parse_args(args)?).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// The handler bound to one built-in capability name.
pub struct MemoryCapability<R> {
    operation: MemoryOperation,
    backend: Arc<MemoryBackend<R>>,
}

impl<R: FragmentRepository> CapabilityHandler for MemoryCapability<R> {
    async fn call(&self, ctx: InvocationContext, args: Value) -> Result<Value, CapabilityError> {
        self.backend.run(self.operation, ctx, args).await
    }
}

/// Build the process-wide capability table with every built-in operation.
pub fn builtin_table<R: FragmentRepository + 'static>(
    backend: Arc<MemoryBackend<R>>,
) -> CapabilityTable {
    MemoryOperation::ALL
        .into_iter()
        .fold(CapabilityTable::builder(), |builder, operation| {
            builder.bind(
                operation.name(),
                MemoryCapability {
                    operation,
                    backend: Arc::clone(&backend),
                },
            )
        })
        .build()
}
