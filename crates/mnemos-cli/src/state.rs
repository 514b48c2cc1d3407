//! Application state wiring the registry, storage and LLM adapter together.
//!
//! Built once per process and passed to command handlers. Nothing here is a
//! global: every collaborator is constructed from the loaded config.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use secrecy::{ExposeSecret, SecretString};

use mnemos_core::llm::boxed::BoxLlmProvider;
use mnemos_core::llm::retry::{RetryingTranscriber, RetryingVision};
use mnemos_core::memory::builtin::{MemoryBackend, builtin_table};
use mnemos_core::memory::dispatcher::Dispatcher;
use mnemos_core::memory::registry::MemoryRegistry;
use mnemos_infra::config::{data_dir, load_global_config};
use mnemos_infra::llm::openai::OpenAiProvider;
use mnemos_infra::llm::openai::transcription::OpenAiTranscriber;
use mnemos_infra::llm::{self, API_KEY_ENV};
use mnemos_infra::sqlite::fragment::SqliteFragmentRepository;
use mnemos_infra::sqlite::pool::{DatabasePool, database_url};
use mnemos_infra::sqlite::schema::SqliteSchemaStore;
use mnemos_types::config::GlobalConfig;

/// The registry pinned to the SQLite schema store.
pub type ConcreteRegistry = MemoryRegistry<SqliteSchemaStore>;

pub struct AppState {
    pub registry: Arc<ConcreteRegistry>,
    pub config: GlobalConfig,
    pub db_pool: DatabasePool,
    api_key: Option<SecretString>,
}

impl AppState {
    /// Initialize from the environment: data directory, config file, API key.
    pub async fn init() -> Result<Self> {
        Self::open(data_dir(), llm::api_key_from_env()).await
    }

    /// Open the state rooted at `data_dir`, creating the database if needed.
    pub async fn open(data_dir: PathBuf, api_key: Option<String>) -> Result<Self> {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_global_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("failed to open the mnemos database")?;
        let registry = MemoryRegistry::new(SqliteSchemaStore::new(db_pool.clone()));
        tracing::debug!(data_dir = %data_dir.display(), "Opened application state");

        Ok(Self {
            registry: Arc::new(registry),
            config,
            db_pool,
            api_key: api_key.map(SecretString::from),
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret())
            .ok_or_else(|| anyhow!("{API_KEY_ENV} is not set"))
    }

    /// Retrying chat provider.
    pub fn llm(&self) -> Result<BoxLlmProvider> {
        Ok(llm::create_provider(&self.config.llm, Some(self.api_key()?))?)
    }

    pub fn transcriber(&self) -> Result<RetryingTranscriber<OpenAiTranscriber>> {
        Ok(llm::create_transcriber(&self.config.llm, Some(self.api_key()?))?)
    }

    pub fn vision(&self) -> Result<RetryingVision<OpenAiProvider>> {
        Ok(llm::create_vision(&self.config.llm, Some(self.api_key()?))?)
    }

    /// Dispatcher with every built-in memory capability bound.
    pub fn dispatcher(&self) -> Result<Dispatcher> {
        let embedder = llm::create_embedder(&self.config.llm, Some(self.api_key()?))?;
        let backend = MemoryBackend::new(
            SqliteFragmentRepository::new(self.db_pool.clone()),
            embedder,
            self.config.memory.default_fetch_limit,
        )
        .with_llm(self.llm()?);

        Ok(Dispatcher::new(builtin_table(Arc::new(backend))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_types::profile::OwnerId;

    #[tokio::test]
    async fn test_open_creates_database_and_resolves_owner() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let state = AppState::open(data_dir.clone(), None).await.unwrap();
        assert!(data_dir.join("mnemos.db").exists());

        let session = state.registry.resolve(&OwnerId::from("676")).await.unwrap();
        assert!(session.is_new_owner());
        assert_eq!(state.config.memory.default_fetch_limit, 5);
    }

    #[tokio::test]
    async fn test_llm_collaborators_require_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::open(dir.path().to_path_buf(), None).await.unwrap();

        let err = state.dispatcher().err().unwrap();
        assert!(err.to_string().contains(API_KEY_ENV));
        assert!(state.llm().is_err());
        assert!(state.transcriber().is_err());
    }

    #[tokio::test]
    async fn test_dispatcher_binds_builtin_table() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::open(dir.path().to_path_buf(), Some("sk-test".to_string()))
            .await
            .unwrap();

        let dispatcher = state.dispatcher().unwrap();
        assert_eq!(dispatcher.table().len(), 9);
        assert!(dispatcher.table().contains("fetch_memories"));
    }
}
