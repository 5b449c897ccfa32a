//! The profile store.
//!
//! Sole authority for profile identity: it assigns ids (through the
//! backend), decides insert-vs-update from the identity tag, and owns every
//! cache population and eviction. Persistence always happens before the
//! matching cache mutation, so a backend failure can never leave the cache
//! showing state that was never durably stored.

use crate::backend::{FieldAttachment, ProfileBackend};
use crate::cache::ProfileCache;
use crate::cascade::CascadeCoordinator;
use crate::error::{StoreError, StoreResult};
use crate::registry::KindRegistry;
use persona_model::{Profile, ProfileIdentity};
use persona_types::{ProfileId, SubjectId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Store for typed per-subject profiles.
pub struct ProfileStore {
    backend: Arc<dyn ProfileBackend>,
    fields: Arc<dyn FieldAttachment>,
    cache: ProfileCache,
    registry: KindRegistry,
}

impl ProfileStore {
    /// Creates a store over separate persistence and field-attachment
    /// collaborators.
    pub fn new(backend: Arc<dyn ProfileBackend>, fields: Arc<dyn FieldAttachment>) -> Self {
        Self {
            registry: KindRegistry::new(backend.clone()),
            cache: ProfileCache::new(),
            backend,
            fields,
        }
    }

    /// Creates a store over a single collaborator implementing both seams,
    /// such as [`SqliteBackend`](crate::SqliteBackend).
    pub fn with_backend<B>(backend: Arc<B>) -> Self
    where
        B: ProfileBackend + FieldAttachment + 'static,
    {
        Self::new(backend.clone(), backend)
    }

    /// The kind registry.
    pub fn kinds(&self) -> &KindRegistry {
        &self.registry
    }

    pub(crate) fn backend(&self) -> &dyn ProfileBackend {
        self.backend.as_ref()
    }

    /// Creates a new unsaved profile of a registered kind.
    ///
    /// No persistence or cache interaction happens here; the profile exists
    /// only in memory until [`save`](Self::save).
    pub fn create(&self, kind: &str, subject: Option<SubjectId>) -> StoreResult<Profile> {
        let definition = self.registry.load(kind).map_err(|e| match e {
            StoreError::NotFound(_) => StoreError::UnknownKind(kind.to_string()),
            other => other,
        })?;

        let mut profile = Profile::new(kind, subject);
        profile.label = definition.label;
        profile.created_at = now_millis();
        profile.changed_at = profile.created_at;
        debug!("Created profile in memory (kind={kind})");
        Ok(profile)
    }

    /// Persists a profile, inserting or updating per its identity tag, and
    /// returns it with identity and timestamps settled.
    ///
    /// Fails with [`StoreError::DuplicateProfile`] if another saved profile
    /// already occupies the same (subject, kind) pair.
    pub fn save(&self, mut profile: Profile) -> StoreResult<Profile> {
        if let Some(subject) = profile.subject {
            for existing in self.backend.select_by_subject(subject)? {
                if existing.kind != profile.kind {
                    continue;
                }
                if let Some(existing_id) = existing.id() {
                    if Some(existing_id) != profile.id() {
                        return Err(StoreError::DuplicateProfile {
                            subject,
                            kind: profile.kind,
                            existing: existing_id,
                        });
                    }
                }
            }
        }

        profile.changed_at = now_millis();
        if profile.created_at == 0 {
            profile.created_at = profile.changed_at;
        }
        if profile.label.is_empty() {
            match self.registry.load(&profile.kind) {
                Ok(definition) => profile.label = definition.label,
                Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let id = match profile.identity {
            ProfileIdentity::Unsaved => {
                let id = self.backend.insert(&profile)?;
                profile.identity = ProfileIdentity::Persisted(id);
                debug!("Inserted profile {id} (kind={})", profile.kind);
                id
            }
            ProfileIdentity::Persisted(id) => {
                self.backend.update(&profile)?;
                debug!("Updated profile {id} (kind={})", profile.kind);
                id
            }
        };
        self.fields.save_fields(&profile.kind, id, &profile.fields)?;

        self.cache.put(&profile);
        if let Some(subject) = profile.subject {
            self.cache.clear_subject_complete(subject);
        }
        Ok(profile)
    }

    /// Loads one profile by id, cache-first.
    pub fn load(&self, id: ProfileId) -> StoreResult<Profile> {
        if let Some(profile) = self.cache.get(id) {
            return Ok(profile);
        }

        let row = self
            .backend
            .select_by_id(id)?
            .ok_or_else(|| StoreError::NotFound(format!("profile {id}")))?;
        let profile = self.hydrate(row)?;
        self.cache.put(&profile);
        Ok(profile)
    }

    /// Bulk load. Empty `ids` means every profile. Missing ids are omitted,
    /// never an error.
    ///
    /// `reset_cache` bypasses cached entries and repopulates them from the
    /// returned rows; entries for ids not returned stay untouched.
    pub fn load_multiple(
        &self,
        ids: &[ProfileId],
        reset_cache: bool,
    ) -> StoreResult<BTreeMap<ProfileId, Profile>> {
        let mut result = BTreeMap::new();

        if ids.is_empty() {
            for row in self.backend.select_all()? {
                let profile = self.hydrate(row)?;
                self.cache.put(&profile);
                if let Some(id) = profile.id() {
                    result.insert(id, profile);
                }
            }
            return Ok(result);
        }

        let mut missing = Vec::new();
        for id in ids {
            if result.contains_key(id) || missing.contains(id) {
                continue;
            }
            if !reset_cache {
                if let Some(profile) = self.cache.get(*id) {
                    result.insert(*id, profile);
                    continue;
                }
            }
            missing.push(*id);
        }

        for row in self.backend.select_by_ids(&missing)? {
            let profile = self.hydrate(row)?;
            self.cache.put(&profile);
            if let Some(id) = profile.id() {
                result.insert(id, profile);
            }
        }
        Ok(result)
    }

    /// Returns the subject's profiles as a {kind → profile} map, covering
    /// every kind the subject has a saved profile in.
    ///
    /// Trusts the per-subject cache only when its completeness flag is set;
    /// otherwise reloads the full set from the backend and marks it.
    pub fn load_by_subject(&self, subject: SubjectId) -> StoreResult<BTreeMap<String, Profile>> {
        if let Some(result) = self.cache.complete_subject(subject) {
            debug!("Serving profiles of {subject} from cache");
            return Ok(result);
        }

        let mut result = BTreeMap::new();
        for row in self.backend.select_by_subject(subject)? {
            let profile = self.hydrate(row)?;
            self.cache.put(&profile);
            result.insert(profile.kind.clone(), profile);
        }
        self.cache.mark_subject_complete(subject);
        Ok(result)
    }

    /// Loads the subject's profile of one kind, cache-first.
    pub fn load_by_subject_kind(&self, subject: SubjectId, kind: &str) -> StoreResult<Profile> {
        if let Some(profile) = self.cache.get_by_subject_kind(subject, kind) {
            return Ok(profile);
        }

        let row = self
            .backend
            .select_by_subject(subject)?
            .into_iter()
            .find(|p| p.kind == kind)
            .ok_or_else(|| {
                StoreError::NotFound(format!("profile of kind '{kind}' for subject {subject}"))
            })?;
        let profile = self.hydrate(row)?;
        self.cache.put(&profile);
        Ok(profile)
    }

    /// Deletes a profile. A never-saved profile is a no-op.
    pub fn delete(&self, profile: &Profile) -> StoreResult<()> {
        match profile.identity {
            ProfileIdentity::Unsaved => Ok(()),
            ProfileIdentity::Persisted(id) => {
                self.delete_by_id(id)?;
                Ok(())
            }
        }
    }

    /// Bulk delete. Missing ids are skipped; per-item failures are collected
    /// and reported together after every deletion was attempted. Returns the
    /// number of profiles actually deleted.
    pub fn delete_multiple(&self, ids: &[ProfileId]) -> StoreResult<usize> {
        let mut deleted = 0;
        let mut failures = Vec::new();
        for id in ids {
            match self.delete_by_id(*id) {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to delete profile {id}: {e}");
                    failures.push((*id, e.to_string()));
                }
            }
        }

        if failures.is_empty() {
            Ok(deleted)
        } else {
            Err(StoreError::Bulk {
                attempted: ids.len(),
                failures,
            })
        }
    }

    /// Deletes a kind definition and cascades to every profile of that kind.
    ///
    /// Fails with [`StoreError::LockedKind`] when the kind is locked.
    /// Returns the number of cascaded profile deletions.
    pub fn delete_kind(&self, id: &str) -> StoreResult<usize> {
        let definition = self.registry.load(id)?;
        if definition.locked {
            return Err(StoreError::LockedKind(id.to_string()));
        }

        self.backend.delete_kind(id)?;
        let cascaded = CascadeCoordinator::new(self).on_kind_deleted(id);
        self.registry.evict(id);
        let deleted = cascaded?;
        debug!("Deleted profile kind '{id}' ({deleted} profiles cascaded)");
        Ok(deleted)
    }

    /// Deletes one row plus its field payload and cache entries. Returns
    /// false when no such profile exists.
    fn delete_by_id(&self, id: ProfileId) -> StoreResult<bool> {
        // The row is needed even on the cache-miss path: eviction and field
        // deletion key on its subject and kind.
        let profile = match self.cache.get(id) {
            Some(profile) => profile,
            None => match self.backend.select_by_id(id)? {
                Some(row) => row,
                None => return Ok(false),
            },
        };

        self.fields.delete_fields(&profile.kind, id)?;
        self.backend.delete_by_ids(&[id])?;
        self.cache.evict(&profile);
        debug!("Deleted profile {id} (kind={})", profile.kind);
        Ok(true)
    }

    /// Attaches the field payload to a backend row.
    fn hydrate(&self, mut profile: Profile) -> StoreResult<Profile> {
        if let Some(id) = profile.id() {
            profile.fields = self.fields.load_fields(&profile.kind, id)?;
        }
        Ok(profile)
    }
}
