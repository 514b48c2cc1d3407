//! Schema store trait definition.
//!
//! The schema store is the persistence boundary for memory profiles: one row
//! per owner holding the attribute and capability vocabulary.

use mnemos_types::error::SchemaError;
use mnemos_types::profile::{MemoryProfile, OwnerId, ProfileId, Vocabulary};

/// Repository trait for memory profile persistence.
///
/// Implementations live in mnemos-infra (e.g., `SqliteSchemaStore`).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait SchemaStore: Send + Sync {
    /// Look up the profile for an owner. No side effects.
    fn find_profile(
        &self,
        owner_id: &OwnerId,
    ) -> impl std::future::Future<Output = Result<Option<MemoryProfile>, SchemaError>> + Send;

    /// Create the owner and its profile in one transactional unit, seeded with
    /// `Vocabulary::defaults()`.
    ///
    /// Must fail with `SchemaError::DuplicateOwner` when a profile already
    /// exists; this is the only arbiter of uniqueness for concurrent resolves.
    fn create_profile(
        &self,
        owner_id: &OwnerId,
    ) -> impl std::future::Future<Output = Result<MemoryProfile, SchemaError>> + Send;

    /// Deserialize the stored vocabulary.
    ///
    /// An unparsable list is `SchemaError::CorruptSchema`, never an empty set.
    fn read_schema(
        &self,
        profile_id: &ProfileId,
    ) -> impl std::future::Future<Output = Result<Vocabulary, SchemaError>> + Send;

    /// Overwrite the stored vocabulary. Last writer wins.
    fn write_schema(
        &self,
        profile_id: &ProfileId,
        vocabulary: &Vocabulary,
    ) -> impl std::future::Future<Output = Result<(), SchemaError>> + Send;
}
