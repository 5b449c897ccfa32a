//! Cascade coordinator.
//!
//! Reacts to kind deletion and subject removal by deleting the dependent
//! profiles through the store's own bulk-delete path, so cache coherency
//! rides the store's eviction logic rather than a parallel one.
//!
//! Cascades are best-effort-atomic: a failure partway leaves the already
//! deleted profiles deleted, the failure is reported, and the remaining
//! deletions are still attempted.

use crate::error::StoreResult;
use crate::store::ProfileStore;
use persona_types::{ProfileId, SubjectEvent, SubjectId};
use tracing::debug;

/// Deletes profiles orphaned by kind or subject removal.
pub struct CascadeCoordinator<'a> {
    store: &'a ProfileStore,
}

impl<'a> CascadeCoordinator<'a> {
    /// Creates a coordinator over the given store.
    pub fn new(store: &'a ProfileStore) -> Self {
        Self { store }
    }

    /// Deletes every profile of a kind whose definition was removed.
    /// Returns the number of profiles deleted.
    pub fn on_kind_deleted(&self, kind: &str) -> StoreResult<usize> {
        let ids = self.store.backend().select_ids_by_kind(kind)?;
        debug!("Cascading kind '{kind}' deletion to {} profiles", ids.len());
        self.store.delete_multiple(&ids)
    }

    /// Deletes every profile attached to a removed subject.
    /// Returns the number of profiles deleted.
    pub fn on_subject_removed(&self, subject: SubjectId) -> StoreResult<usize> {
        let ids: Vec<ProfileId> = self
            .store
            .backend()
            .select_by_subject(subject)?
            .iter()
            .filter_map(|p| p.id())
            .collect();
        debug!("Cascading subject {subject} removal to {} profiles", ids.len());
        self.store.delete_multiple(&ids)
    }

    /// Applies a subject-lifecycle event.
    pub fn apply(&self, event: &SubjectEvent) -> StoreResult<usize> {
        match event {
            SubjectEvent::Removed { subject } => self.on_subject_removed(*subject),
        }
    }
}
