//! Error types for the profile store.

use persona_types::{ProfileId, SubjectId};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Profile created against a kind that is not registered.
    #[error("unknown profile kind: {0}")]
    UnknownKind(String),

    /// A saved profile already occupies this (subject, kind) pair.
    #[error("subject {subject} already has a '{kind}' profile (id {existing})")]
    DuplicateProfile {
        subject: SubjectId,
        kind: String,
        existing: ProfileId,
    },

    /// The kind is locked and cannot be deleted.
    #[error("profile kind '{0}' is locked")]
    LockedKind(String),

    /// Single-item lookup found nothing. Bulk lookups never raise this;
    /// they omit missing ids instead.
    #[error("not found: {0}")]
    NotFound(String),

    /// Backend failure, with context. The store never retries these.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Field payload (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Aggregate of per-item failures from a bulk or cascading delete.
    /// Every deletion was attempted; the ones listed here failed.
    #[error("bulk delete failed for {} of {attempted} profiles", failures.len())]
    Bulk {
        attempted: usize,
        failures: Vec<(ProfileId, String)>,
    },
}
