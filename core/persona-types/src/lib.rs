//! Core type definitions for Persona.
//!
//! This crate defines the fundamental, kind-agnostic types used throughout
//! the profile engine:
//! - Profile and Subject identifiers
//! - Subject-lifecycle events (consumed by the cascade coordinator)
//!
//! All kind-specific data (the per-kind field payloads) belongs to the
//! field-attachment layer, not here.

mod event;
mod ids;

pub use event::SubjectEvent;
pub use ids::{ProfileId, SubjectId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid profile id: {0}")]
    InvalidProfileId(#[from] std::num::ParseIntError),
}
