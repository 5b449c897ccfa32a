//! Subject-lifecycle events.
//!
//! The external user system owns subject accounts; when one goes away, it
//! emits a [`SubjectEvent`] that the cascade coordinator consumes to delete
//! the subject's dependent profiles. The core never originates these events.

use crate::SubjectId;
use serde::{Deserialize, Serialize};

/// A lifecycle notification about an external subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SubjectEvent {
    /// The subject was removed from the external user system.
    ///
    /// Every profile attached to it must be deleted.
    Removed { subject: SubjectId },
}

impl SubjectEvent {
    /// The subject this event applies to.
    #[must_use]
    pub fn subject(&self) -> SubjectId {
        match self {
            Self::Removed { subject } => *subject,
        }
    }
}
