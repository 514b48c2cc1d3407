//! SQLite fragment repository implementation.
//!
//! Embeddings are stored as JSON arrays; similarity ranking is done by the
//! caller over the rows of one `(profile_id, namespace)` partition.

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use mnemos_core::repository::fragment::FragmentRepository;
use mnemos_types::error::RepositoryError;
use mnemos_types::memory::{FragmentKind, MemoryFragment, MemoryTier};
use mnemos_types::profile::ProfileId;

use super::pool::DatabasePool;
use super::schema::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `FragmentRepository`.
pub struct SqliteFragmentRepository {
    pool: DatabasePool,
}

impl SqliteFragmentRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn row_to_fragment(row: &sqlx::sqlite::SqliteRow) -> Result<MemoryFragment, RepositoryError> {
    let get = |col: &str| -> Result<String, RepositoryError> {
        row.try_get(col)
            .map_err(|e| RepositoryError::Query(e.to_string()))
    };
    let related_to: Option<String> = row
        .try_get("related_to")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(MemoryFragment {
        id: get("id")?
            .parse::<Uuid>()
            .map_err(|e| RepositoryError::Query(format!("invalid fragment id: {e}")))?,
        profile_id: get("profile_id")?
            .parse::<ProfileId>()
            .map_err(|e| RepositoryError::Query(format!("invalid profile id: {e}")))?,
        namespace: get("namespace")?,
        content: get("content")?,
        metadata: serde_json::from_str(&get("metadata")?)
            .map_err(|e| RepositoryError::Query(format!("invalid metadata: {e}")))?,
        embedding: serde_json::from_str(&get("embedding")?)
            .map_err(|e| RepositoryError::Query(format!("invalid embedding: {e}")))?,
        kind: get("kind")?
            .parse::<FragmentKind>()
            .map_err(RepositoryError::Query)?,
        related_to: related_to
            .map(|s| s.parse::<Uuid>())
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid related id: {e}")))?,
        created_at: parse_datetime(&get("created_at")?)?,
    })
}

impl FragmentRepository for SqliteFragmentRepository {
    async fn save(&self, fragment: &MemoryFragment) -> Result<(), RepositoryError> {
        let metadata = serde_json::to_string(&fragment.metadata)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let embedding = serde_json::to_string(&fragment.embedding)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            "INSERT INTO memory_fragments
                (id, profile_id, namespace, content, metadata, embedding, kind, related_to, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(fragment.id.to_string())
        .bind(fragment.profile_id.to_string())
        .bind(&fragment.namespace)
        .bind(&fragment.content)
        .bind(metadata)
        .bind(embedding)
        .bind(fragment.kind.to_string())
        .bind(fragment.related_to.map(|id| id.to_string()))
        .bind(format_datetime(&fragment.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.message().contains("UNIQUE") {
                    return RepositoryError::Conflict(format!(
                        "fragment {} already exists",
                        fragment.id
                    ));
                }
            }
            RepositoryError::Query(e.to_string())
        })?;

        Ok(())
    }

    async fn list_namespace(
        &self,
        profile_id: &ProfileId,
        namespace: &str,
    ) -> Result<Vec<MemoryFragment>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM memory_fragments
             WHERE profile_id = ? AND namespace = ?
             ORDER BY created_at DESC",
        )
        .bind(profile_id.to_string())
        .bind(namespace)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(row_to_fragment).collect()
    }

    async fn delete(
        &self,
        profile_id: &ProfileId,
        namespace: &str,
        id: &Uuid,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM memory_fragments WHERE id = ? AND profile_id = ? AND namespace = ?",
        )
        .bind(id.to_string())
        .bind(profile_id.to_string())
        .bind(namespace)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_namespace(
        &self,
        profile_id: &ProfileId,
        namespace: &str,
    ) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM memory_fragments WHERE profile_id = ? AND namespace = ?")
                .bind(profile_id.to_string())
                .bind(namespace)
                .execute(&self.pool.writer)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn ensure_namespace(
        &self,
        profile_id: &ProfileId,
        namespace: &str,
        tier: MemoryTier,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO memory_namespaces (profile_id, namespace, tier, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(profile_id.to_string())
        .bind(namespace)
        .bind(tier.to_string())
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
