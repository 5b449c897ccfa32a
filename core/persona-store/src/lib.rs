//! Profile store core for Persona.
//!
//! Owns the lifecycle of typed per-subject profile records:
//!
//! - [`KindRegistry`] — memoized kind definitions (label, weight, locked)
//! - [`ProfileCache`] — two-level, never-authoritative cache (by id, and
//!   per-subject with completeness tracking)
//! - [`ProfileStore`] — create/load/save/delete, single and bulk, with
//!   write-through caching and persist-then-cache ordering
//! - [`CascadeCoordinator`] — deletes dependent profiles when a kind or a
//!   subject goes away
//!
//! Persistence and the per-kind field payloads are reached only through the
//! [`ProfileBackend`] and [`FieldAttachment`] seams; [`SqliteBackend`]
//! implements both on bundled SQLite.

mod backend;
mod cache;
mod cascade;
mod error;
mod registry;
mod sqlite;
mod store;

pub use backend::{FieldAttachment, ProfileBackend};
pub use cache::ProfileCache;
pub use cascade::CascadeCoordinator;
pub use error::{StoreError, StoreResult};
pub use registry::KindRegistry;
pub use sqlite::SqliteBackend;
pub use store::ProfileStore;
