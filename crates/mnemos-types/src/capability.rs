//! Per-entity capability sets.
//!
//! A `CapabilitySet` records which attribute names are present on one memory
//! entity and which capability names the dispatcher may invoke on it. Only
//! names are stored here; attribute values live with the entity's own state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::profile::{Vocabulary, VocabularyKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    attributes: BTreeSet<String>,
    capabilities: BTreeSet<String>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name. Adding an existing name is a no-op and returns `false`.
    pub fn insert(&mut self, kind: VocabularyKind, name: impl Into<String>) -> bool {
        match kind {
            VocabularyKind::Attribute => self.attributes.insert(name.into()),
            VocabularyKind::Capability => self.capabilities.insert(name.into()),
        }
    }

    /// Remove a name. Returns `false` if it was not present.
    pub fn remove(&mut self, kind: VocabularyKind, name: &str) -> bool {
        match kind {
            VocabularyKind::Attribute => self.attributes.remove(name),
            VocabularyKind::Capability => self.capabilities.remove(name),
        }
    }

    pub fn contains(&self, kind: VocabularyKind, name: &str) -> bool {
        match kind {
            VocabularyKind::Attribute => self.attributes.contains(name),
            VocabularyKind::Capability => self.capabilities.contains(name),
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.contains(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(String::as_str)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.capabilities.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.capabilities.is_empty()
    }

    /// Fold this set's names into a vocabulary (used when syncing a session).
    pub fn extend_vocabulary(&self, vocabulary: &mut Vocabulary) -> bool {
        let mut changed = false;
        for name in &self.attributes {
            changed |= vocabulary.insert(VocabularyKind::Attribute, name.clone());
        }
        for name in &self.capabilities {
            changed |= vocabulary.insert(VocabularyKind::Capability, name.clone());
        }
        changed
    }
}
