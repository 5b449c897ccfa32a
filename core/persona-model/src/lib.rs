//! Core profile model for Persona.
//!
//! Defines the universal types the store and its collaborators depend on:
//! - [`Profile`] — a typed per-subject record (identity, kind, JSON field
//!   payload, timestamps)
//! - [`ProfileIdentity`] — explicit saved/unsaved identity tag
//! - [`ProfileKind`] — a registered profile kind (label, ordering weight,
//!   locked flag)
//!
//! The field payload is an opaque JSON object owned by the field-attachment
//! layer; the model only carries it and offers pointer-based accessors.

mod kind;
mod profile;

pub use kind::ProfileKind;
pub use profile::{Profile, ProfileIdentity};
