//! Kind registry.
//!
//! Load-through memoization of kind definitions. The "all loaded" flag
//! distinguishes "nothing queried yet" from "queried, empty", so an empty
//! listing is itself cacheable.

use crate::backend::ProfileBackend;
use crate::error::{StoreError, StoreResult};
use persona_model::ProfileKind;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Default)]
struct RegistryState {
    kinds: HashMap<String, ProfileKind>,
    all_loaded: bool,
}

/// Registry of profile kind definitions.
pub struct KindRegistry {
    backend: Arc<dyn ProfileBackend>,
    state: Mutex<RegistryState>,
}

impl KindRegistry {
    /// Creates a registry over the given backend.
    pub fn new(backend: Arc<dyn ProfileBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Inserts or overwrites a kind definition by id. Idempotent.
    ///
    /// The full-listing memo is invalidated so a later `load_all` reflects
    /// the change.
    pub fn upsert(&self, kind: &ProfileKind) -> StoreResult<()> {
        self.backend.upsert_kind(kind)?;
        let mut state = self.state.lock().unwrap();
        state.kinds.insert(kind.id.clone(), kind.clone());
        state.all_loaded = false;
        debug!("Upserted profile kind '{}'", kind.id);
        Ok(())
    }

    /// Returns the kind definition, memoizing backend hits.
    pub fn load(&self, id: &str) -> StoreResult<ProfileKind> {
        if let Some(kind) = self.state.lock().unwrap().kinds.get(id) {
            return Ok(kind.clone());
        }

        match self.backend.select_kind_by_id(id)? {
            Some(kind) => {
                self.state
                    .lock()
                    .unwrap()
                    .kinds
                    .insert(kind.id.clone(), kind.clone());
                Ok(kind)
            }
            None => Err(StoreError::NotFound(format!("profile kind '{id}'"))),
        }
    }

    /// Returns every known kind, ordered by weight ascending with ties
    /// broken by id. `reset_cache` discards memoized state first.
    pub fn load_all(&self, reset_cache: bool) -> StoreResult<Vec<ProfileKind>> {
        let needs_load = {
            let mut state = self.state.lock().unwrap();
            if reset_cache {
                state.kinds.clear();
                state.all_loaded = false;
            }
            !state.all_loaded
        };

        if needs_load {
            let kinds = self.backend.select_all_kinds()?;
            let mut state = self.state.lock().unwrap();
            state.kinds = kinds.into_iter().map(|k| (k.id.clone(), k)).collect();
            state.all_loaded = true;
        }

        let mut result: Vec<ProfileKind> =
            self.state.lock().unwrap().kinds.values().cloned().collect();
        result.sort_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.id.cmp(&b.id)));
        Ok(result)
    }

    /// Drops a kind from the memoized state after deletion.
    pub(crate) fn evict(&self, id: &str) {
        self.state.lock().unwrap().kinds.remove(id);
    }
}
