//! Dispatcher: invokes capabilities on entities by name.
//!
//! An invocation succeeds only if the entity holds the capability name AND
//! the closed `CapabilityTable` has an implementation bound to it. The two
//! failures are reported separately so schema/implementation drift is loud.
//! No lock is taken: concurrent invocations on one entity are allowed.

use futures_util::future::join_all;
use serde_json::Value;

use super::entity::EntityHandle;
use super::handler::{CapabilityError, CapabilityTable, InvocationContext};
use super::registry::RegistryError;
use super::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("capability '{capability}' is not granted on entity '{entity}'")]
    CapabilityNotGranted { entity: String, capability: String },

    #[error("capability '{0}' is granted but has no bound implementation")]
    NoImplementationBound(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("capability failed: {0}")]
    Capability(#[from] CapabilityError),
}

/// One call in a batch.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub entity: EntityHandle,
    pub capability: String,
    pub args: Value,
}

impl Invocation {
    pub fn new(entity: EntityHandle, capability: impl Into<String>, args: Value) -> Self {
        Self {
            entity,
            capability: capability.into(),
            args,
        }
    }
}

pub struct Dispatcher {
    table: CapabilityTable,
}

impl Dispatcher {
    pub fn new(table: CapabilityTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CapabilityTable {
        &self.table
    }

    /// Invoke `capability` on `entity` with JSON arguments.
    #[tracing::instrument(
        name = "invoke_capability",
        skip_all,
        fields(owner_id = %session.owner_id(), entity = %entity, capability = capability)
    )]
    pub async fn invoke(
        &self,
        session: &Session,
        entity: EntityHandle,
        capability: &str,
        args: Value,
    ) -> Result<Value, DispatchError> {
        let profile = session.ensure_ready()?;
        let target = session.get(entity)?;

        if !target.capabilities().has_capability(capability) {
            tracing::debug!(entity = target.name(), "Capability not granted");
            return Err(DispatchError::CapabilityNotGranted {
                entity: target.name().to_string(),
                capability: capability.to_string(),
            });
        }

        let Some(handler) = self.table.get(capability) else {
            tracing::warn!(entity = target.name(), "Granted capability has no implementation");
            return Err(DispatchError::NoImplementationBound(capability.to_string()));
        };

        let ctx = InvocationContext {
            owner_id: profile.owner_id.clone(),
            profile_id: profile.profile_id.clone(),
            entity_name: target.name().to_string(),
            namespace: target.namespace().to_string(),
            available_operations: target
                .capabilities()
                .capabilities()
                .filter(|name| self.table.contains(name))
                .map(str::to_string)
                .collect(),
        };

        let result = handler.call(ctx, args).await;
        if let Err(e) = &result {
            tracing::warn!(entity = target.name(), error = %e, "Capability failed");
        }
        Ok(result?)
    }

    /// Run every invocation concurrently.
    ///
    /// Results come back in request order; one failure never cancels the
    /// others.
    pub async fn invoke_batch(
        &self,
        session: &Session,
        calls: Vec<Invocation>,
    ) -> Vec<Result<Value, DispatchError>> {
        tracing::debug!(count = calls.len(), "Dispatching batch");
        join_all(calls.into_iter().map(|call| async move {
            self.invoke(session, call.entity, &call.capability, call.args)
                .await
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::handler::CapabilityHandler;
    use crate::memory::registry::MemoryRegistry;
    use crate::memory::registry::tests::MockSchemaStore;
    use mnemos_types::profile::{OwnerId, VocabularyKind};
    use serde_json::json;
    use std::time::Duration;

    /// Echoes its context back, optionally after a delay.
    struct EchoHandler {
        delay_ms: u64,
    }

    impl CapabilityHandler for EchoHandler {
        async fn call(&self, ctx: InvocationContext, args: Value) -> Result<Value, CapabilityError> {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            Ok(json!({
                "entity": ctx.entity_name,
                "namespace": ctx.namespace,
                "operations": ctx.available_operations,
                "args": args,
            }))
        }
    }

    struct FailingHandler;

    impl CapabilityHandler for FailingHandler {
        async fn call(&self, _ctx: InvocationContext, _args: Value) -> Result<Value, CapabilityError> {
            Err(CapabilityError::InvalidArguments("missing 'observation'".to_string()))
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            CapabilityTable::builder()
                .bind("add_memories", EchoHandler { delay_ms: 20 })
                .bind("fetch_memories", EchoHandler { delay_ms: 0 })
                .bind("delete_memories", FailingHandler)
                .build(),
        )
    }

    async fn ready_session() -> (MemoryRegistry<MockSchemaStore>, Session, EntityHandle) {
        let registry = MemoryRegistry::new(MockSchemaStore::default());
        let mut session = registry.resolve(&OwnerId::from("U1")).await.unwrap();
        let entity = registry
            .activate_role(&mut session, "SemanticMemory", "SEMANTICMEMORY")
            .unwrap();
        (registry, session, entity)
    }

    #[tokio::test]
    async fn test_granted_and_bound_capability_runs() {
        let (registry, mut session, entity) = ready_session().await;
        registry.grant_capability(&mut session, entity, "add_memories").unwrap();

        let out = dispatcher()
            .invoke(&session, entity, "add_memories", json!({"observation": "hi"}))
            .await
            .unwrap();
        assert_eq!(out["entity"], "SemanticMemory");
        assert_eq!(out["namespace"], "SEMANTICMEMORY");
        assert_eq!(out["args"]["observation"], "hi");
    }

    #[tokio::test]
    async fn test_ungranted_capability_is_rejected_until_granted() {
        let (registry, mut session, entity) = ready_session().await;
        let dispatcher = dispatcher();
        registry.grant_capability(&mut session, entity, "add_memories").unwrap();

        let err = dispatcher
            .invoke(&session, entity, "fetch_memories", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::CapabilityNotGranted { ref capability, .. } if capability == "fetch_memories"
        ));

        registry.grant_capability(&mut session, entity, "fetch_memories").unwrap();
        assert!(dispatcher
            .invoke(&session, entity, "fetch_memories", json!({}))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_granted_but_unbound_capability_reports_drift() {
        let (registry, mut session, entity) = ready_session().await;
        registry
            .extend_vocabulary(&mut session, VocabularyKind::Capability, "summarize")
            .unwrap();
        registry.grant_capability(&mut session, entity, "summarize").unwrap();

        let err = dispatcher()
            .invoke(&session, entity, "summarize", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoImplementationBound(ref name) if name == "summarize"));
    }

    #[tokio::test]
    async fn test_context_lists_only_bound_grants() {
        let (registry, mut session, entity) = ready_session().await;
        registry
            .extend_vocabulary(&mut session, VocabularyKind::Capability, "summarize")
            .unwrap();
        for name in ["summarize", "fetch_memories", "add_memories"] {
            registry.grant_capability(&mut session, entity, name).unwrap();
        }

        let out = dispatcher()
            .invoke(&session, entity, "fetch_memories", json!({}))
            .await
            .unwrap();
        assert_eq!(out["operations"], json!(["add_memories", "fetch_memories"]));
    }

    #[tokio::test]
    async fn test_handler_failure_is_returned_not_panicked() {
        let (registry, mut session, entity) = ready_session().await;
        registry.grant_capability(&mut session, entity, "delete_memories").unwrap();

        let err = dispatcher()
            .invoke(&session, entity, "delete_memories", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Capability(CapabilityError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn test_closed_session_cannot_invoke() {
        let (registry, mut session, entity) = ready_session().await;
        registry.grant_capability(&mut session, entity, "add_memories").unwrap();
        registry.close(&mut session);

        let err = dispatcher()
            .invoke(&session, entity, "add_memories", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Registry(RegistryError::SessionClosed)));
    }

    #[tokio::test]
    async fn test_batch_keeps_request_order_and_isolates_failures() {
        let (registry, mut session, entity) = ready_session().await;
        for name in ["add_memories", "fetch_memories", "delete_memories"] {
            registry.grant_capability(&mut session, entity, name).unwrap();
        }

        let results = dispatcher()
            .invoke_batch(
                &session,
                vec![
                    // Slowest first so completion order differs from request order.
                    Invocation::new(entity, "add_memories", json!({"n": 0})),
                    Invocation::new(entity, "delete_memories", json!({"n": 1})),
                    Invocation::new(entity, "fetch_memories", json!({"n": 2})),
                    Invocation::new(entity, "run_cycle", json!({"n": 3})),
                ],
            )
            .await;

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap()["args"]["n"], 0);
        assert!(matches!(results[1], Err(DispatchError::Capability(_))));
        assert_eq!(results[2].as_ref().unwrap()["args"]["n"], 2);
        assert!(matches!(results[3], Err(DispatchError::CapabilityNotGranted { .. })));
    }
}
