//! SQLite schema store implementation.
//!
//! Implements `SchemaStore` from `mnemos-core`. The owner row and the profile
//! row are created in one transaction, and the primary/unique keys on both
//! tables are what reject a second concurrent creation for the same owner.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use mnemos_core::repository::schema::SchemaStore;
use mnemos_types::error::{RepositoryError, SchemaError, SchemaField};
use mnemos_types::profile::{MemoryProfile, OwnerId, ProfileId, Vocabulary};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SchemaStore`.
pub struct SqliteSchemaStore {
    pool: DatabasePool,
}

impl SqliteSchemaStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width UTC timestamps, so `ORDER BY created_at` sorts chronologically.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn query_err(e: sqlx::Error) -> SchemaError {
    SchemaError::Storage(RepositoryError::Query(e.to_string()))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE"))
}

fn encode_list(names: &[String]) -> Result<String, SchemaError> {
    serde_json::to_string(names)
        .map_err(|e| SchemaError::Storage(RepositoryError::Query(e.to_string())))
}

fn decode_list(
    profile_id: &ProfileId,
    field: SchemaField,
    raw: &str,
) -> Result<Vec<String>, SchemaError> {
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| SchemaError::CorruptSchema {
        profile_id: profile_id.clone(),
        field,
        reason: e.to_string(),
    })
}

fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> Result<MemoryProfile, RepositoryError> {
    let owner_id: String = row
        .try_get("owner_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let profile_id_str: String = row
        .try_get("profile_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let created_at_str: String = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let updated_at_str: String = row
        .try_get("updated_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(MemoryProfile {
        owner_id: OwnerId(owner_id),
        profile_id: profile_id_str
            .parse::<ProfileId>()
            .map_err(|e| RepositoryError::Query(format!("invalid profile id: {e}")))?,
        created_at: parse_datetime(&created_at_str)?,
        updated_at: parse_datetime(&updated_at_str)?,
    })
}

impl SchemaStore for SqliteSchemaStore {
    async fn find_profile(&self, owner_id: &OwnerId) -> Result<Option<MemoryProfile>, SchemaError> {
        let row = sqlx::query(
            "SELECT owner_id, profile_id, created_at, updated_at
             FROM memory_profiles WHERE owner_id = ?",
        )
        .bind(owner_id.as_str())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        match row {
            Some(ref r) => Ok(Some(row_to_profile(r)?)),
            None => Ok(None),
        }
    }

    async fn create_profile(&self, owner_id: &OwnerId) -> Result<MemoryProfile, SchemaError> {
        let now = Utc::now();
        let profile = MemoryProfile {
            owner_id: owner_id.clone(),
            profile_id: ProfileId::new(),
            created_at: now,
            updated_at: now,
        };
        let defaults = Vocabulary::defaults();
        let duplicate_or_query = |e: sqlx::Error| {
            if is_unique_violation(&e) {
                SchemaError::DuplicateOwner(owner_id.to_string())
            } else {
                query_err(e)
            }
        };

        // Owner row and profile row commit together or not at all.
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        sqlx::query("INSERT INTO owners (id, created_at) VALUES (?, ?)")
            .bind(owner_id.as_str())
            .bind(format_datetime(&now))
            .execute(&mut *tx)
            .await
            .map_err(duplicate_or_query)?;

        sqlx::query(
            "INSERT INTO memory_profiles
                (profile_id, owner_id, attribute_list, capability_list, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(profile.profile_id.to_string())
        .bind(owner_id.as_str())
        .bind(encode_list(defaults.attributes())?)
        .bind(encode_list(defaults.capabilities())?)
        .bind(format_datetime(&profile.created_at))
        .bind(format_datetime(&profile.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(duplicate_or_query)?;

        tx.commit().await.map_err(query_err)?;

        tracing::debug!(owner_id = %owner_id, profile_id = %profile.profile_id, "Inserted memory profile");
        Ok(profile)
    }

    async fn read_schema(&self, profile_id: &ProfileId) -> Result<Vocabulary, SchemaError> {
        let row = sqlx::query(
            "SELECT attribute_list, capability_list FROM memory_profiles WHERE profile_id = ?",
        )
        .bind(profile_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?
        .ok_or_else(|| SchemaError::ProfileNotFound(profile_id.clone()))?;

        let attribute_list: String = row.try_get("attribute_list").map_err(query_err)?;
        let capability_list: String = row.try_get("capability_list").map_err(query_err)?;

        let attributes = decode_list(profile_id, SchemaField::AttributeList, &attribute_list)?;
        let capabilities = decode_list(profile_id, SchemaField::CapabilityList, &capability_list)?;
        Ok(Vocabulary::new(attributes, capabilities))
    }

    async fn write_schema(
        &self,
        profile_id: &ProfileId,
        vocabulary: &Vocabulary,
    ) -> Result<(), SchemaError> {
        let result = sqlx::query(
            "UPDATE memory_profiles
             SET attribute_list = ?, capability_list = ?, updated_at = ?
             WHERE profile_id = ?",
        )
        .bind(encode_list(vocabulary.attributes())?)
        .bind(encode_list(vocabulary.capabilities())?)
        .bind(format_datetime(&Utc::now()))
        .bind(profile_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(SchemaError::ProfileNotFound(profile_id.clone()));
        }
        Ok(())
    }
}
