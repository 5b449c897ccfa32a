//! Collaborator seams: row persistence and field-payload attachment.
//!
//! The store talks to its persistence engine and to the field-attachment
//! subsystem only through these traits. Rows travel without their field
//! payloads; the store attaches payloads after each row fetch and persists
//! them after each row upsert.

use crate::error::StoreResult;
use persona_model::{Profile, ProfileKind};
use persona_types::{ProfileId, SubjectId};

/// Row persistence for profiles and kind definitions.
///
/// Profiles returned by the `select_*` methods carry a `Persisted` identity
/// and an empty field payload; the store hydrates payloads through
/// [`FieldAttachment`]. Implementations are synchronous from the store's
/// perspective and own no retry policy.
pub trait ProfileBackend: Send + Sync {
    /// Inserts an unsaved profile's row and returns the assigned id.
    fn insert(&self, profile: &Profile) -> StoreResult<ProfileId>;

    /// Updates the row of an already-persisted profile.
    fn update(&self, profile: &Profile) -> StoreResult<()>;

    fn select_by_id(&self, id: ProfileId) -> StoreResult<Option<Profile>>;

    /// Fetches the rows for the given ids, omitting ids with no row.
    fn select_by_ids(&self, ids: &[ProfileId]) -> StoreResult<Vec<Profile>>;

    fn select_all(&self) -> StoreResult<Vec<Profile>>;

    /// Every profile attached to the subject.
    fn select_by_subject(&self, subject: SubjectId) -> StoreResult<Vec<Profile>>;

    /// Ids of every profile of the given kind, attached or not.
    fn select_ids_by_kind(&self, kind: &str) -> StoreResult<Vec<ProfileId>>;

    /// Deletes the given rows. Missing ids are not an error.
    fn delete_by_ids(&self, ids: &[ProfileId]) -> StoreResult<()>;

    fn select_kind_by_id(&self, id: &str) -> StoreResult<Option<ProfileKind>>;

    fn select_all_kinds(&self) -> StoreResult<Vec<ProfileKind>>;

    /// Inserts or overwrites a kind definition by id.
    fn upsert_kind(&self, kind: &ProfileKind) -> StoreResult<()>;

    /// Removes a kind definition. Missing ids are not an error.
    fn delete_kind(&self, id: &str) -> StoreResult<()>;
}

/// Storage for the opaque per-profile field payload.
///
/// The payload's structure is defined per kind by the field-attachment
/// subsystem; the store passes it through verbatim.
pub trait FieldAttachment: Send + Sync {
    /// Loads the payload for a profile. A profile with no stored payload
    /// yields an empty JSON object.
    fn load_fields(&self, kind: &str, id: ProfileId) -> StoreResult<serde_json::Value>;

    fn save_fields(&self, kind: &str, id: ProfileId, fields: &serde_json::Value)
        -> StoreResult<()>;

    fn delete_fields(&self, kind: &str, id: ProfileId) -> StoreResult<()>;
}
