//! Two-level profile cache.
//!
//! Never authoritative: every entry is a coherency-bounded copy of what the
//! backend returned. Two indices: by profile id, and per-subject
//! {kind -> id} slots with a "complete" flag set only after a full
//! per-subject load, so partial results never masquerade as the whole set.
//!
//! Each index sits behind its own lock; no lock is held across a backend
//! call, and the two locks are never nested.

use persona_model::Profile;
use persona_types::{ProfileId, SubjectId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Default)]
struct SubjectSlot {
    by_kind: HashMap<String, ProfileId>,
    complete: bool,
}

/// Process-local memoized view of profiles.
#[derive(Default)]
pub struct ProfileCache {
    by_id: Mutex<HashMap<ProfileId, Profile>>,
    subjects: Mutex<HashMap<SubjectId, SubjectSlot>>,
}

impl ProfileCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the cached profile, if present.
    pub fn get(&self, id: ProfileId) -> Option<Profile> {
        self.by_id.lock().unwrap().get(&id).cloned()
    }

    /// Stores a saved profile in both indices, overwriting stale entries.
    ///
    /// Unsaved profiles have no id to key on and are ignored. The subject's
    /// completeness flag is left as-is; callers that mutate single profiles
    /// clear it via [`clear_subject_complete`](Self::clear_subject_complete).
    pub fn put(&self, profile: &Profile) {
        let Some(id) = profile.id() else {
            return;
        };
        self.by_id.lock().unwrap().insert(id, profile.clone());
        if let Some(subject) = profile.subject {
            let mut subjects = self.subjects.lock().unwrap();
            subjects
                .entry(subject)
                .or_default()
                .by_kind
                .insert(profile.kind.clone(), id);
        }
    }

    /// Removes a profile from both indices and clears its subject's
    /// completeness flag.
    pub fn evict(&self, profile: &Profile) {
        let Some(id) = profile.id() else {
            return;
        };
        self.by_id.lock().unwrap().remove(&id);
        if let Some(subject) = profile.subject {
            let mut subjects = self.subjects.lock().unwrap();
            if let Some(slot) = subjects.get_mut(&subject) {
                slot.by_kind.remove(&profile.kind);
                slot.complete = false;
            }
        }
    }

    /// Returns a copy of the subject's profile of the given kind, if cached.
    pub fn get_by_subject_kind(&self, subject: SubjectId, kind: &str) -> Option<Profile> {
        let id = {
            let subjects = self.subjects.lock().unwrap();
            subjects.get(&subject)?.by_kind.get(kind).copied()?
        };
        self.get(id)
    }

    /// Marks the subject's slot as covering every kind it has a saved
    /// profile in. Set only after a full per-subject load.
    pub fn mark_subject_complete(&self, subject: SubjectId) {
        self.subjects
            .lock()
            .unwrap()
            .entry(subject)
            .or_default()
            .complete = true;
    }

    /// Drops the completeness flag, forcing the next full per-subject query
    /// back to the backend.
    pub fn clear_subject_complete(&self, subject: SubjectId) {
        if let Some(slot) = self.subjects.lock().unwrap().get_mut(&subject) {
            slot.complete = false;
        }
    }

    /// Returns the subject's full {kind → profile} map, but only when the
    /// slot is complete and every referenced profile is still cached.
    /// Anything less returns `None` so the caller reloads from the backend.
    pub fn complete_subject(&self, subject: SubjectId) -> Option<BTreeMap<String, Profile>> {
        let ids: Vec<(String, ProfileId)> = {
            let subjects = self.subjects.lock().unwrap();
            let slot = subjects.get(&subject)?;
            if !slot.complete {
                return None;
            }
            slot.by_kind
                .iter()
                .map(|(kind, id)| (kind.clone(), *id))
                .collect()
        };

        let by_id = self.by_id.lock().unwrap();
        let mut result = BTreeMap::new();
        for (kind, id) in ids {
            result.insert(kind, by_id.get(&id)?.clone());
        }
        Some(result)
    }
}
