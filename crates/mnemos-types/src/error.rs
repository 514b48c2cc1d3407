use thiserror::Error;

use crate::profile::ProfileId;

/// Errors from repository operations (used by trait definitions in mnemos-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Which persisted schema list a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaField {
    AttributeList,
    CapabilityList,
}

impl std::fmt::Display for SchemaField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaField::AttributeList => write!(f, "attribute_list"),
            SchemaField::CapabilityList => write!(f, "capability_list"),
        }
    }
}

/// Errors raised by a `SchemaStore` (profile persistence boundary).
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A profile already exists for this owner. The caller should re-resolve
    /// the owner as an existing one.
    #[error("owner '{0}' already has a memory profile")]
    DuplicateOwner(String),

    /// The stored list could not be parsed. Never defaulted to an empty set.
    #[error("corrupt {field} for profile {profile_id}: {reason}")]
    CorruptSchema {
        profile_id: ProfileId,
        field: SchemaField,
        reason: String,
    },

    #[error("memory profile {0} not found")]
    ProfileNotFound(ProfileId),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}
