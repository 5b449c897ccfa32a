use serde::{Deserialize, Serialize};

/// A registered profile kind.
///
/// Pure metadata: the kind defines which profiles may exist, how listings
/// are ordered, and whether the kind may be deleted. The per-kind field
/// schema lives with the field-attachment layer, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileKind {
    /// Unique id, immutable after creation. Profiles reference it by value.
    pub id: String,
    pub label: String,
    /// Sort order for listings; ties break on `id` ascending.
    #[serde(default)]
    pub weight: i32,
    /// A locked kind cannot be deleted.
    #[serde(default)]
    pub locked: bool,
}

impl ProfileKind {
    /// Creates an unlocked kind with weight 0.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            weight: 0,
            locked: false,
        }
    }

    /// Sets the ordering weight.
    #[must_use]
    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    /// Marks the kind as locked (undeletable).
    #[must_use]
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}
