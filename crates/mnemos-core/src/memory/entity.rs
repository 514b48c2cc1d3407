//! Dynamic entities and their arena handles.

use std::collections::BTreeSet;
use std::fmt;

use mnemos_types::capability::CapabilitySet;
use mnemos_types::profile::ProfileId;

/// Stable index of an entity inside one `Session`.
///
/// Handles are only meaningful for the session that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub(crate) usize);

impl EntityHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One activated role (e.g. "SemanticMemory") scoped to a profile and namespace.
///
/// Transient: only the profile vocabulary is persisted, never the entity.
#[derive(Debug, Clone)]
pub struct DynamicEntity {
    name: String,
    namespace: String,
    profile_id: ProfileId,
    capabilities: CapabilitySet,
    associations: BTreeSet<EntityHandle>,
}

impl DynamicEntity {
    pub(crate) fn new(name: String, namespace: String, profile_id: ProfileId) -> Self {
        Self {
            name,
            namespace,
            profile_id,
            capabilities: CapabilitySet::new(),
            associations: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn profile_id(&self) -> &ProfileId {
        &self.profile_id
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub(crate) fn capabilities_mut(&mut self) -> &mut CapabilitySet {
        &mut self.capabilities
    }

    pub fn associations(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.associations.iter().copied()
    }

    pub fn is_associated_with(&self, other: EntityHandle) -> bool {
        self.associations.contains(&other)
    }

    /// Record one direction of an association. Returns `false` if present.
    pub(crate) fn link(&mut self, other: EntityHandle) -> bool {
        self.associations.insert(other)
    }
}
