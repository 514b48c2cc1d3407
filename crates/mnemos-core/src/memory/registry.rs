//! MemoryRegistry: resolves owners into sessions and manages their entities.
//!
//! The persisted profile vocabulary is the authority on which names an entity
//! may hold. Entities start empty; every grant is checked against the
//! session's vocabulary, and `sync` writes the union of the vocabulary and all
//! entity sets back through the `SchemaStore`.

use mnemos_types::error::SchemaError;
use mnemos_types::profile::{MemoryProfile, OwnerId, Vocabulary, VocabularyKind};

use crate::repository::schema::SchemaStore;

use super::entity::EntityHandle;
use super::session::{Session, SessionState};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("'{name}' is not in the profile's {kind} vocabulary")]
    UnknownSchemaMember { kind: VocabularyKind, name: String },

    #[error("session is closed")]
    SessionClosed,

    #[error("session is not ready (state: {0})")]
    NotReady(SessionState),

    #[error("no entity {0} in this session")]
    UnknownEntity(EntityHandle),

    #[error("entity '{0}' cannot be associated with itself")]
    SelfAssociation(String),
}

// ---------------------------------------------------------------------------
// MemoryRegistry
// ---------------------------------------------------------------------------

/// Orchestrates profile resolution and per-session entity management.
///
/// Constructed once per process (or per test) with an explicit store.
pub struct MemoryRegistry<S> {
    store: S,
}

impl<S: SchemaStore> MemoryRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve an owner into a ready session, creating the profile on first
    /// sight.
    ///
    /// A concurrent first resolve of the same owner surfaces as
    /// `SchemaError::DuplicateOwner`; resolving again then finds the profile
    /// the other caller created.
    pub async fn resolve(&self, owner_id: &OwnerId) -> Result<Session, RegistryError> {
        let mut session = Session::new(owner_id.clone());
        self.resolve_session(&mut session).await?;
        Ok(session)
    }

    /// Drive an unresolved session to `Ready`. Resolving a ready session is a
    /// no-op.
    #[tracing::instrument(name = "resolve_owner", skip(self, session), fields(owner_id = %session.owner_id()))]
    pub async fn resolve_session(&self, session: &mut Session) -> Result<(), RegistryError> {
        match session.state {
            SessionState::Closed => return Err(RegistryError::SessionClosed),
            SessionState::Ready => return Ok(()),
            SessionState::Unresolved | SessionState::Resolving => {}
        }

        session.state = SessionState::Resolving;
        match self.load(session.owner_id()).await {
            Ok((profile, vocabulary, created)) => {
                session.profile = Some(profile);
                session.vocabulary = vocabulary;
                session.new_owner = created;
                session.dirty = false;
                session.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                session.state = SessionState::Unresolved;
                Err(e)
            }
        }
    }

    async fn load(
        &self,
        owner_id: &OwnerId,
    ) -> Result<(MemoryProfile, Vocabulary, bool), RegistryError> {
        if let Some(profile) = self.store.find_profile(owner_id).await? {
            let vocabulary = self
                .store
                .read_schema(&profile.profile_id)
                .await
                .inspect_err(|e| {
                    if matches!(e, SchemaError::CorruptSchema { .. }) {
                        tracing::error!(profile_id = %profile.profile_id, error = %e, "Stored schema is unreadable");
                    }
                })?;
            tracing::info!(
                profile_id = %profile.profile_id,
                attributes = vocabulary.attributes().len(),
                capabilities = vocabulary.capabilities().len(),
                "Resolved existing owner"
            );
            return Ok((profile, vocabulary, false));
        }

        let profile = self.store.create_profile(owner_id).await?;
        tracing::info!(profile_id = %profile.profile_id, "Created memory profile for new owner");
        Ok((profile, Vocabulary::defaults(), true))
    }

    /// Activate a role in the session. Activating the same
    /// `(entity_name, namespace)` again returns the same handle.
    ///
    /// The new entity holds no attributes or capabilities.
    pub fn activate_role(
        &self,
        session: &mut Session,
        entity_name: &str,
        namespace: &str,
    ) -> Result<EntityHandle, RegistryError> {
        let profile_id = session.ensure_ready()?.profile_id.clone();
        let (handle, created) = session.insert_entity(entity_name, namespace, profile_id);
        if created {
            tracing::debug!(entity = entity_name, namespace, %handle, "Activated role");
        }
        Ok(handle)
    }

    /// Grant an attribute from the vocabulary. Returns `false` if the entity
    /// already had it.
    pub fn grant_attribute(
        &self,
        session: &mut Session,
        entity: EntityHandle,
        name: &str,
    ) -> Result<bool, RegistryError> {
        grant(session, entity, VocabularyKind::Attribute, name)
    }

    /// Grant a capability from the vocabulary. Returns `false` if the entity
    /// already had it.
    pub fn grant_capability(
        &self,
        session: &mut Session,
        entity: EntityHandle,
        name: &str,
    ) -> Result<bool, RegistryError> {
        grant(session, entity, VocabularyKind::Capability, name)
    }

    /// Remove an attribute from one entity. Returns `false` if it was absent.
    pub fn revoke_attribute(
        &self,
        session: &mut Session,
        entity: EntityHandle,
        name: &str,
    ) -> Result<bool, RegistryError> {
        revoke(session, entity, VocabularyKind::Attribute, name)
    }

    /// Remove a capability from one entity. Returns `false` if it was absent.
    pub fn revoke_capability(
        &self,
        session: &mut Session,
        entity: EntityHandle,
        name: &str,
    ) -> Result<bool, RegistryError> {
        revoke(session, entity, VocabularyKind::Capability, name)
    }

    /// Add a name to the session's vocabulary so it can be granted.
    ///
    /// Takes effect in the store only after `sync`.
    pub fn extend_vocabulary(
        &self,
        session: &mut Session,
        kind: VocabularyKind,
        name: &str,
    ) -> Result<bool, RegistryError> {
        session.ensure_ready()?;
        let added = session.vocabulary.insert(kind, name);
        if added {
            session.dirty = true;
            tracing::debug!(%kind, name, "Extended session vocabulary");
        }
        Ok(added)
    }

    /// Associate two entities in both directions. Returns `false` if they were
    /// already associated.
    pub fn associate(
        &self,
        session: &mut Session,
        a: EntityHandle,
        b: EntityHandle,
    ) -> Result<bool, RegistryError> {
        session.ensure_ready()?;
        let name = session.get(a)?.name().to_string();
        session.get(b)?;
        if a == b {
            return Err(RegistryError::SelfAssociation(name));
        }
        let forward = session.get_mut(a)?.link(b);
        let backward = session.get_mut(b)?.link(a);
        Ok(forward || backward)
    }

    /// Persist the vocabulary joined with every active entity's names.
    ///
    /// Returns the vocabulary that was written.
    #[tracing::instrument(skip(self, session), fields(owner_id = %session.owner_id()))]
    pub async fn sync(&self, session: &mut Session) -> Result<Vocabulary, RegistryError> {
        let profile_id = session.ensure_ready()?.profile_id.clone();
        let mut vocabulary = session.vocabulary.clone();
        for entity in &session.entities {
            entity.capabilities().extend_vocabulary(&mut vocabulary);
        }

        self.store.write_schema(&profile_id, &vocabulary).await?;
        tracing::info!(
            %profile_id,
            attributes = vocabulary.attributes().len(),
            capabilities = vocabulary.capabilities().len(),
            "Synced profile schema"
        );

        session.vocabulary = vocabulary.clone();
        session.dirty = false;
        Ok(vocabulary)
    }

    /// Discard the session. Persisted state is untouched.
    pub fn close(&self, session: &mut Session) {
        if session.state != SessionState::Closed {
            tracing::debug!(owner_id = %session.owner_id(), "Closed session");
        }
        session.state = SessionState::Closed;
    }
}

fn grant(
    session: &mut Session,
    entity: EntityHandle,
    kind: VocabularyKind,
    name: &str,
) -> Result<bool, RegistryError> {
    session.ensure_ready()?;
    session.get(entity)?;
    if !session.vocabulary.contains(kind, name) {
        return Err(RegistryError::UnknownSchemaMember {
            kind,
            name: name.to_string(),
        });
    }
    Ok(session.get_mut(entity)?.capabilities_mut().insert(kind, name))
}

fn revoke(
    session: &mut Session,
    entity: EntityHandle,
    kind: VocabularyKind,
    name: &str,
) -> Result<bool, RegistryError> {
    session.ensure_ready()?;
    Ok(session.get_mut(entity)?.capabilities_mut().remove(kind, name))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use mnemos_types::error::SchemaField;
    use mnemos_types::profile::ProfileId;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory schema store. A stored `None` vocabulary models a row whose
    /// lists cannot be parsed.
    #[derive(Default)]
    pub(crate) struct MockSchemaStore {
        profiles: Mutex<HashMap<OwnerId, MemoryProfile>>,
        schemas: Mutex<HashMap<ProfileId, Option<Vocabulary>>>,
    }

    impl MockSchemaStore {
        pub(crate) fn corrupt(&self, profile_id: &ProfileId) {
            self.schemas.lock().unwrap().insert(profile_id.clone(), None);
        }

        pub(crate) fn stored(&self, profile_id: &ProfileId) -> Option<Vocabulary> {
            self.schemas.lock().unwrap().get(profile_id).cloned().flatten()
        }
    }

    impl SchemaStore for MockSchemaStore {
        async fn find_profile(&self, owner_id: &OwnerId) -> Result<Option<MemoryProfile>, SchemaError> {
            Ok(self.profiles.lock().unwrap().get(owner_id).cloned())
        }

        async fn create_profile(&self, owner_id: &OwnerId) -> Result<MemoryProfile, SchemaError> {
            let mut profiles = self.profiles.lock().unwrap();
            if profiles.contains_key(owner_id) {
                return Err(SchemaError::DuplicateOwner(owner_id.to_string()));
            }
            let now = Utc::now();
            let profile = MemoryProfile {
                owner_id: owner_id.clone(),
                profile_id: ProfileId::new(),
                created_at: now,
                updated_at: now,
            };
            self.schemas
                .lock()
                .unwrap()
                .insert(profile.profile_id.clone(), Some(Vocabulary::defaults()));
            profiles.insert(owner_id.clone(), profile.clone());
            Ok(profile)
        }

        async fn read_schema(&self, profile_id: &ProfileId) -> Result<Vocabulary, SchemaError> {
            match self.schemas.lock().unwrap().get(profile_id) {
                Some(Some(vocabulary)) => Ok(vocabulary.clone()),
                Some(None) => Err(SchemaError::CorruptSchema {
                    profile_id: profile_id.clone(),
                    field: SchemaField::AttributeList,
                    reason: "not a list".to_string(),
                }),
                None => Err(SchemaError::ProfileNotFound(profile_id.clone())),
            }
        }

        async fn write_schema(
            &self,
            profile_id: &ProfileId,
            vocabulary: &Vocabulary,
        ) -> Result<(), SchemaError> {
            self.schemas
                .lock()
                .unwrap()
                .insert(profile_id.clone(), Some(vocabulary.clone()));
            Ok(())
        }
    }

    fn registry() -> MemoryRegistry<MockSchemaStore> {
        MemoryRegistry::new(MockSchemaStore::default())
    }

    #[tokio::test]
    async fn test_new_owner_gets_default_vocabulary() {
        let registry = registry();
        let session = registry.resolve(&OwnerId::from("U1")).await.unwrap();

        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.is_new_owner());
        assert_eq!(session.vocabulary(), &Vocabulary::defaults());
        assert_eq!(session.entities().count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_twice_returns_same_profile_id() {
        let registry = registry();
        let owner = OwnerId::from("676");
        let first = registry.resolve(&owner).await.unwrap();
        let second = registry.resolve(&owner).await.unwrap();

        assert_eq!(first.profile_id(), second.profile_id());
        assert!(!second.is_new_owner());
    }

    #[tokio::test]
    async fn test_corrupt_schema_fails_resolve() {
        let registry = registry();
        let owner = OwnerId::from("U2");
        let session = registry.resolve(&owner).await.unwrap();
        registry.store().corrupt(session.profile_id().unwrap());

        let mut retry = Session::new(owner);
        let err = registry.resolve_session(&mut retry).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Schema(SchemaError::CorruptSchema { .. })
        ));
        assert_eq!(retry.state(), SessionState::Unresolved);
        assert!(retry.profile().is_none());
    }

    #[tokio::test]
    async fn test_activate_role_is_idempotent_and_starts_empty() {
        let registry = registry();
        let mut session = registry.resolve(&OwnerId::from("U1")).await.unwrap();

        let a = registry
            .activate_role(&mut session, "SemanticMemory", "SEMANTICMEMORY")
            .unwrap();
        let b = registry
            .activate_role(&mut session, "SemanticMemory", "SEMANTICMEMORY")
            .unwrap();
        let c = registry
            .activate_role(&mut session, "SemanticMemory", "OTHER")
            .unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(session.entities().count(), 2);
        assert!(session.entity(a).unwrap().capabilities().is_empty());
        assert_eq!(session.find("SemanticMemory", "SEMANTICMEMORY"), Some(a));
    }

    #[tokio::test]
    async fn test_grant_requires_vocabulary_membership() {
        let registry = registry();
        let mut session = registry.resolve(&OwnerId::from("U1")).await.unwrap();
        let entity = registry
            .activate_role(&mut session, "EpisodicMemory", "EPISODICMEMORY")
            .unwrap();

        let err = registry
            .grant_attribute(&mut session, entity, "x")
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::UnknownSchemaMember { kind: VocabularyKind::Attribute, ref name } if name == "x"
        ));

        assert!(registry
            .extend_vocabulary(&mut session, VocabularyKind::Attribute, "x")
            .unwrap());
        assert!(session.is_dirty());
        assert!(registry.grant_attribute(&mut session, entity, "x").unwrap());
        assert!(!registry.grant_attribute(&mut session, entity, "x").unwrap());
        assert!(session.entity(entity).unwrap().capabilities().has_attribute("x"));
    }

    #[tokio::test]
    async fn test_attribute_and_capability_vocabularies_are_separate() {
        let registry = registry();
        let mut session = registry.resolve(&OwnerId::from("U1")).await.unwrap();
        let entity = registry
            .activate_role(&mut session, "SemanticMemory", "SEMANTICMEMORY")
            .unwrap();

        // "namespace" is a default attribute, not a capability.
        assert!(registry.grant_attribute(&mut session, entity, "namespace").unwrap());
        assert!(matches!(
            registry.grant_capability(&mut session, entity, "namespace"),
            Err(RegistryError::UnknownSchemaMember { kind: VocabularyKind::Capability, .. })
        ));
    }

    #[tokio::test]
    async fn test_revoke_removes_from_one_entity() {
        let registry = registry();
        let mut session = registry.resolve(&OwnerId::from("U1")).await.unwrap();
        let a = registry.activate_role(&mut session, "A", "NS").unwrap();
        let b = registry.activate_role(&mut session, "B", "NS").unwrap();
        registry.grant_capability(&mut session, a, "run_cycle").unwrap();
        registry.grant_capability(&mut session, b, "run_cycle").unwrap();

        assert!(registry.revoke_capability(&mut session, a, "run_cycle").unwrap());
        assert!(!registry.revoke_capability(&mut session, a, "run_cycle").unwrap());
        assert!(!session.entity(a).unwrap().capabilities().has_capability("run_cycle"));
        assert!(session.entity(b).unwrap().capabilities().has_capability("run_cycle"));
    }

    #[tokio::test]
    async fn test_associate_is_symmetric_and_deduplicated() {
        let registry = registry();
        let mut session = registry.resolve(&OwnerId::from("U1")).await.unwrap();
        let a = registry.activate_role(&mut session, "SemanticMemory", "SEMANTICMEMORY").unwrap();
        let b = registry.activate_role(&mut session, "EpisodicMemory", "EPISODICMEMORY").unwrap();

        assert!(registry.associate(&mut session, a, b).unwrap());
        assert!(!registry.associate(&mut session, a, b).unwrap());
        assert!(!registry.associate(&mut session, b, a).unwrap());

        let from_a: Vec<_> = session.entity(a).unwrap().associations().collect();
        let from_b: Vec<_> = session.entity(b).unwrap().associations().collect();
        assert_eq!(from_a, vec![b]);
        assert_eq!(from_b, vec![a]);
    }

    #[tokio::test]
    async fn test_associate_rejects_self_and_unknown_handles() {
        let registry = registry();
        let mut session = registry.resolve(&OwnerId::from("U1")).await.unwrap();
        let a = registry.activate_role(&mut session, "SemanticMemory", "S").unwrap();

        assert!(matches!(
            registry.associate(&mut session, a, a),
            Err(RegistryError::SelfAssociation(_))
        ));
        assert!(matches!(
            registry.associate(&mut session, a, EntityHandle(42)),
            Err(RegistryError::UnknownEntity(_))
        ));
        assert_eq!(session.entity(a).unwrap().associations().count(), 0);
    }

    #[tokio::test]
    async fn test_sync_persists_extensions() {
        let registry = registry();
        let owner = OwnerId::from("U1");
        let mut session = registry.resolve(&owner).await.unwrap();
        let entity = registry.activate_role(&mut session, "ProceduralMemory", "P").unwrap();
        registry
            .extend_vocabulary(&mut session, VocabularyKind::Capability, "summarize")
            .unwrap();
        registry.grant_capability(&mut session, entity, "summarize").unwrap();

        let written = registry.sync(&mut session).await.unwrap();
        assert!(!session.is_dirty());
        assert!(written.contains(VocabularyKind::Capability, "summarize"));
        assert!(written.contains(VocabularyKind::Capability, "add_memories"));

        let reloaded = registry.resolve(&owner).await.unwrap();
        assert!(reloaded.vocabulary().same_members(&written));
    }

    #[tokio::test]
    async fn test_unsynced_extension_is_not_persisted() {
        let registry = registry();
        let owner = OwnerId::from("U1");
        let mut session = registry.resolve(&owner).await.unwrap();
        registry
            .extend_vocabulary(&mut session, VocabularyKind::Attribute, "mood")
            .unwrap();

        let other = registry.resolve(&owner).await.unwrap();
        assert!(!other.vocabulary().contains(VocabularyKind::Attribute, "mood"));
    }

    #[tokio::test]
    async fn test_closed_session_rejects_operations() {
        let registry = registry();
        let owner = OwnerId::from("U1");
        let mut session = registry.resolve(&owner).await.unwrap();
        let entity = registry.activate_role(&mut session, "SemanticMemory", "S").unwrap();
        registry.close(&mut session);

        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(
            registry.activate_role(&mut session, "Other", "S"),
            Err(RegistryError::SessionClosed)
        ));
        assert!(matches!(
            registry.grant_capability(&mut session, entity, "add_memories"),
            Err(RegistryError::SessionClosed)
        ));
        assert!(matches!(
            registry.sync(&mut session).await,
            Err(RegistryError::SessionClosed)
        ));
        assert!(matches!(
            registry.resolve_session(&mut session).await,
            Err(RegistryError::SessionClosed)
        ));

        // Closing leaves the stored profile alone.
        let reopened = registry.resolve(&owner).await.unwrap();
        assert_eq!(reopened.profile_id(), session.profile_id());
    }

    #[tokio::test]
    async fn test_unresolved_session_is_not_ready() {
        let registry = registry();
        let mut session = Session::new(OwnerId::from("U9"));
        assert!(matches!(
            registry.activate_role(&mut session, "SemanticMemory", "S"),
            Err(RegistryError::NotReady(SessionState::Unresolved))
        ));
        registry.resolve_session(&mut session).await.unwrap();
        assert!(registry.activate_role(&mut session, "SemanticMemory", "S").is_ok());
    }
}
