//! Per-owner session state and the entity arena.

use std::collections::HashMap;
use std::fmt;

use mnemos_types::profile::{MemoryProfile, OwnerId, ProfileId, Vocabulary};

use super::entity::{DynamicEntity, EntityHandle};
use super::registry::RegistryError;

/// Lifecycle of a `Session`.
///
/// `Unresolved -> Resolving -> Ready -> Closed`. A failed resolve falls back
/// to `Unresolved` so the caller can try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unresolved,
    Resolving,
    Ready,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unresolved => write!(f, "unresolved"),
            SessionState::Resolving => write!(f, "resolving"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// The resolved, in-process working state for one owner.
///
/// Entities live in an arena indexed by `EntityHandle`; a second index keyed
/// by `(entity_name, namespace)` makes role activation idempotent. A session
/// assumes a single caller and carries no locks.
#[derive(Debug)]
pub struct Session {
    owner_id: OwnerId,
    pub(crate) state: SessionState,
    pub(crate) profile: Option<MemoryProfile>,
    pub(crate) vocabulary: Vocabulary,
    pub(crate) new_owner: bool,
    pub(crate) dirty: bool,
    pub(crate) entities: Vec<DynamicEntity>,
    index: HashMap<(String, String), EntityHandle>,
}

impl Session {
    /// A fresh, unresolved session for `owner_id`.
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            state: SessionState::Unresolved,
            profile: None,
            vocabulary: Vocabulary::default(),
            new_owner: false,
            dirty: false,
            entities: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> Option<&MemoryProfile> {
        self.profile.as_ref()
    }

    pub fn profile_id(&self) -> Option<&ProfileId> {
        self.profile.as_ref().map(|p| &p.profile_id)
    }

    /// The profile vocabulary as seen by this session, including unsynced
    /// extensions.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Whether resolving this session created the owner's profile.
    pub fn is_new_owner(&self) -> bool {
        self.new_owner
    }

    /// Whether the vocabulary was extended since the last sync.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&DynamicEntity> {
        self.entities.get(handle.0)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityHandle, &DynamicEntity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(idx, entity)| (EntityHandle(idx), entity))
    }

    /// Look up an activated role by name and namespace.
    pub fn find(&self, entity_name: &str, namespace: &str) -> Option<EntityHandle> {
        self.index
            .get(&(entity_name.to_string(), namespace.to_string()))
            .copied()
    }

    pub(crate) fn ensure_ready(&self) -> Result<&MemoryProfile, RegistryError> {
        match (self.state, self.profile.as_ref()) {
            (SessionState::Ready, Some(profile)) => Ok(profile),
            (SessionState::Closed, _) => Err(RegistryError::SessionClosed),
            (state, _) => Err(RegistryError::NotReady(state)),
        }
    }

    pub(crate) fn get(&self, handle: EntityHandle) -> Result<&DynamicEntity, RegistryError> {
        self.entities
            .get(handle.0)
            .ok_or(RegistryError::UnknownEntity(handle))
    }

    pub(crate) fn get_mut(
        &mut self,
        handle: EntityHandle,
    ) -> Result<&mut DynamicEntity, RegistryError> {
        self.entities
            .get_mut(handle.0)
            .ok_or(RegistryError::UnknownEntity(handle))
    }

    /// Return the existing handle for `(entity_name, namespace)` or append a
    /// new entity. The bool is `true` when the entity was created.
    pub(crate) fn insert_entity(
        &mut self,
        entity_name: &str,
        namespace: &str,
        profile_id: ProfileId,
    ) -> (EntityHandle, bool) {
        let key = (entity_name.to_string(), namespace.to_string());
        if let Some(handle) = self.index.get(&key) {
            return (*handle, false);
        }
        let handle = EntityHandle(self.entities.len());
        self.entities.push(DynamicEntity::new(
            key.0.clone(),
            key.1.clone(),
            profile_id,
        ));
        self.index.insert(key, handle);
        (handle, true)
    }
}
