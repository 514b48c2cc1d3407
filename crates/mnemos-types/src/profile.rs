//! Owner and memory profile types.
//!
//! An owner has exactly one `MemoryProfile`. The profile's `Vocabulary` is the
//! sole durable record of which attribute and capability names may be granted
//! to the owner's memory entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Structural attributes every new profile starts with.
pub const DEFAULT_ATTRIBUTES: [&str; 9] = [
    "user_id",
    "index_name",
    "db_type",
    "knowledge_source",
    "knowledge_type",
    "profile_id",
    "long_term_state",
    "short_term_state",
    "namespace",
];

/// Capabilities every new profile starts with.
pub const DEFAULT_CAPABILITIES: [&str; 9] = [
    "create_long_term",
    "create_short_term",
    "add_memories",
    "fetch_memories",
    "delete_memories",
    "build_context",
    "run_cycle",
    "list_operations",
    "provide_feedback",
];

/// Identifier of a user that owns a memory profile.
///
/// Owner ids come from the caller (e.g. "676" or "U1") and are stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a memory profile, wrapping a UUID v7 (time-sortable).
///
/// Generated once when the owner is first seen and never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub Uuid);

impl ProfileId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProfileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Which half of a vocabulary a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocabularyKind {
    Attribute,
    Capability,
}

impl fmt::Display for VocabularyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VocabularyKind::Attribute => write!(f, "attribute"),
            VocabularyKind::Capability => write!(f, "capability"),
        }
    }
}

impl FromStr for VocabularyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "attribute" => Ok(VocabularyKind::Attribute),
            "capability" => Ok(VocabularyKind::Capability),
            other => Err(format!("invalid vocabulary kind: '{other}'")),
        }
    }
}

/// The attribute and capability names a profile allows its entities to hold.
///
/// Both lists keep first-insertion order and never contain duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    attributes: Vec<String>,
    capabilities: Vec<String>,
}

impl Vocabulary {
    /// Build a vocabulary from arbitrary lists, dropping repeated names.
    pub fn new<A, C>(attributes: A, capabilities: C) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let mut vocabulary = Self::default();
        for name in attributes {
            vocabulary.insert(VocabularyKind::Attribute, name);
        }
        for name in capabilities {
            vocabulary.insert(VocabularyKind::Capability, name);
        }
        vocabulary
    }

    /// The vocabulary seeded into a brand-new profile.
    pub fn defaults() -> Self {
        Self::new(DEFAULT_ATTRIBUTES, DEFAULT_CAPABILITIES)
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn names(&self, kind: VocabularyKind) -> &[String] {
        match kind {
            VocabularyKind::Attribute => &self.attributes,
            VocabularyKind::Capability => &self.capabilities,
        }
    }

    pub fn contains(&self, kind: VocabularyKind, name: &str) -> bool {
        self.names(kind).iter().any(|n| n == name)
    }

    /// Append a name. Returns `false` if it was already present.
    pub fn insert(&mut self, kind: VocabularyKind, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(kind, &name) {
            return false;
        }
        match kind {
            VocabularyKind::Attribute => self.attributes.push(name),
            VocabularyKind::Capability => self.capabilities.push(name),
        }
        true
    }

    /// Compare as sets, ignoring the order names were added in.
    pub fn same_members(&self, other: &Vocabulary) -> bool {
        fn as_set(names: &[String]) -> BTreeSet<&String> {
            names.iter().collect()
        }
        as_set(&self.attributes) == as_set(&other.attributes)
            && as_set(&self.capabilities) == as_set(&other.capabilities)
    }
}

/// The persisted profile row for one owner.
///
/// The vocabulary stored with the row is read separately through
/// `SchemaStore::read_schema`, so a corrupt list never hides the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryProfile {
    pub owner_id: OwnerId,
    /// Opaque identifier, stable for the owner's lifetime.
    pub profile_id: ProfileId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
