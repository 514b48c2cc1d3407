//! Capability handlers and the closed table they are bound in.
//!
//! A capability name on an entity is only a token. The `CapabilityTable`
//! maps each token to the code that implements it; it is built once at
//! process start and never changes afterwards.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use mnemos_types::error::RepositoryError;
use mnemos_types::llm::LlmError;
use mnemos_types::profile::{OwnerId, ProfileId};

/// Failures raised by a bound capability implementation.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("capability unavailable: {0}")]
    Unavailable(String),
}

/// Everything a handler may know about the entity it is invoked on.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub owner_id: OwnerId,
    pub profile_id: ProfileId,
    pub entity_name: String,
    pub namespace: String,
    /// Capabilities granted on the entity that also have a binding, sorted.
    pub available_operations: Vec<String>,
}

/// Trait for the implementation behind one capability name.
pub trait CapabilityHandler: Send + Sync {
    fn call(
        &self,
        ctx: InvocationContext,
        args: Value,
    ) -> impl Future<Output = Result<Value, CapabilityError>> + Send;
}

/// Object-safe version of [`CapabilityHandler`] with boxed futures.
pub trait CapabilityHandlerDyn: Send + Sync {
    fn call_boxed<'a>(
        &'a self,
        ctx: InvocationContext,
        args: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, CapabilityError>> + Send + 'a>>;
}

impl<T: CapabilityHandler> CapabilityHandlerDyn for T {
    fn call_boxed<'a>(
        &'a self,
        ctx: InvocationContext,
        args: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, CapabilityError>> + Send + 'a>> {
        Box::pin(self.call(ctx, args))
    }
}

/// Type-erased capability handler.
pub struct BoxCapabilityHandler {
    inner: Box<dyn CapabilityHandlerDyn + Send + Sync>,
}

impl BoxCapabilityHandler {
    pub fn new<T: CapabilityHandler + 'static>(handler: T) -> Self {
        Self {
            inner: Box::new(handler),
        }
    }

    pub async fn call(&self, ctx: InvocationContext, args: Value) -> Result<Value, CapabilityError> {
        self.inner.call_boxed(ctx, args).await
    }
}

/// Immutable name-to-implementation map.
pub struct CapabilityTable {
    bindings: BTreeMap<String, BoxCapabilityHandler>,
}

impl CapabilityTable {
    pub fn builder() -> CapabilityTableBuilder {
        CapabilityTableBuilder {
            bindings: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&BoxCapabilityHandler> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Collects bindings before the table is frozen.
pub struct CapabilityTableBuilder {
    bindings: BTreeMap<String, BoxCapabilityHandler>,
}

impl CapabilityTableBuilder {
    /// Bind `name`. A later binding for the same name replaces the earlier one.
    pub fn bind<T: CapabilityHandler + 'static>(mut self, name: impl Into<String>, handler: T) -> Self {
        let name = name.into();
        if self
            .bindings
            .insert(name.clone(), BoxCapabilityHandler::new(handler))
            .is_some()
        {
            tracing::warn!(capability = %name, "Capability bound twice; keeping the later binding");
        }
        self
    }

    pub fn build(self) -> CapabilityTable {
        CapabilityTable {
            bindings: self.bindings,
        }
    }
}
