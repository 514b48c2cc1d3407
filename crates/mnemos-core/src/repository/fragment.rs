//! Fragment repository trait definition.
//!
//! Fragments are partitioned by `(profile_id, namespace)`. Similarity ranking
//! happens in core (`memory::builtin`), so the store only has to list a
//! partition.

use uuid::Uuid;

use mnemos_types::error::RepositoryError;
use mnemos_types::memory::{MemoryFragment, MemoryTier};
use mnemos_types::profile::ProfileId;

/// Repository trait for memory fragment persistence.
///
/// Implementations live in mnemos-infra (e.g., `SqliteFragmentRepository`).
pub trait FragmentRepository: Send + Sync {
    /// Store a new fragment.
    fn save(
        &self,
        fragment: &MemoryFragment,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All fragments of one namespace, newest first.
    fn list_namespace(
        &self,
        profile_id: &ProfileId,
        namespace: &str,
    ) -> impl std::future::Future<Output = Result<Vec<MemoryFragment>, RepositoryError>> + Send;

    /// Delete one fragment. Returns `false` if it did not exist in the namespace.
    fn delete(
        &self,
        profile_id: &ProfileId,
        namespace: &str,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete every fragment of a namespace. Returns the number removed.
    fn delete_namespace(
        &self,
        profile_id: &ProfileId,
        namespace: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Register a namespace under a retention tier.
    ///
    /// Returns `false` if the namespace was already registered for that tier.
    fn ensure_namespace(
        &self,
        profile_id: &ProfileId,
        namespace: &str,
        tier: MemoryTier,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
