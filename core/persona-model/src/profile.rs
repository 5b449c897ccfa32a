use persona_types::{ProfileId, SubjectId};
use serde::{Deserialize, Serialize};

/// Whether a profile has been persisted yet.
///
/// The store branches on this tag when saving: `Unsaved` inserts and assigns
/// an id, `Persisted` updates in place. There is no sentinel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum ProfileIdentity {
    /// Created in memory, never saved. Carries no id.
    Unsaved,
    /// Saved at least once; the id is stable for the rest of its life.
    Persisted(ProfileId),
}

/// A typed profile record, optionally attached to one external subject.
///
/// The `fields` payload is arbitrary JSON whose structure is defined by the
/// field-attachment layer for this profile's kind. The core stores and
/// returns it verbatim, never interpreting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub identity: ProfileIdentity,
    /// References a registered [`ProfileKind`](crate::ProfileKind) by id.
    pub kind: String,
    /// `None` means the profile is unattached. At most one saved profile may
    /// exist per (subject, kind) pair; unattached profiles are unconstrained.
    pub subject: Option<SubjectId>,
    /// Display label, defaulted from the kind's label at creation.
    pub label: String,
    pub fields: serde_json::Value,
    /// Epoch milliseconds, stamped at creation.
    pub created_at: i64,
    /// Epoch milliseconds, touched on every save.
    pub changed_at: i64,
}

impl Profile {
    /// Creates an unsaved profile of the given kind.
    ///
    /// Label and timestamps are stamped by the store when it hands the
    /// profile out; constructing one directly leaves them empty.
    #[must_use]
    pub fn new(kind: impl Into<String>, subject: Option<SubjectId>) -> Self {
        Self {
            identity: ProfileIdentity::Unsaved,
            kind: kind.into(),
            subject,
            label: String::new(),
            fields: serde_json::Value::Object(serde_json::Map::new()),
            created_at: 0,
            changed_at: 0,
        }
    }

    /// The assigned id, if this profile has been saved.
    #[must_use]
    pub fn id(&self) -> Option<ProfileId> {
        match self.identity {
            ProfileIdentity::Unsaved => None,
            ProfileIdentity::Persisted(id) => Some(id),
        }
    }

    /// Returns true once the profile has been persisted.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self.identity, ProfileIdentity::Persisted(_))
    }

    /// Sets a top-level field in the payload, replacing any existing value.
    ///
    /// If the payload is not a JSON object it is reset to one first.
    pub fn set_field(&mut self, name: impl Into<String>, value: serde_json::Value) {
        if !self.fields.is_object() {
            self.fields = serde_json::Value::Object(serde_json::Map::new());
        }
        if let Some(map) = self.fields.as_object_mut() {
            map.insert(name.into(), value);
        }
    }

    /// Extract a string value from `fields` using a JSON pointer (e.g., "/fullname").
    pub fn field_str(&self, pointer: &str) -> Option<&str> {
        self.fields.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Extract a boolean value from `fields` using a JSON pointer.
    pub fn field_bool(&self, pointer: &str) -> Option<bool> {
        self.fields.pointer(pointer).and_then(|v| v.as_bool())
    }

    /// Extract a numeric value from `fields` using a JSON pointer.
    pub fn field_number(&self, pointer: &str) -> Option<f64> {
        self.fields.pointer(pointer).and_then(|v| v.as_f64())
    }
}
