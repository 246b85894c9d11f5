//! Identifier types for the task synchronization domain.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Prefix distinguishing client placeholder identifiers in display form.
const LOCAL_PREFIX: &str = "local:";

/// Unique identifier for a task record.
///
/// Remote identifiers are assigned by the server on creation, are opaque to
/// the client, and never change. Local identifiers are client-generated
/// placeholders that exist only between an optimistic create and its server
/// acknowledgement, after which the record is re-keyed under the remote
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskId {
    /// Client-generated placeholder for a create not yet acknowledged.
    Local(Uuid),
    /// Server-assigned opaque identifier.
    Remote(String),
}

impl TaskId {
    /// Creates a fresh client placeholder identifier.
    #[must_use]
    pub fn local() -> Self {
        Self::Local(Uuid::new_v4())
    }

    /// Creates an identifier from a server-assigned value.
    #[must_use]
    pub fn remote(value: impl Into<String>) -> Self {
        Self::Remote(value.into())
    }

    /// Reports whether this identifier is a client placeholder.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(uuid) => write!(f, "{LOCAL_PREFIX}{uuid}"),
            Self::Remote(value) => write!(f, "{value}"),
        }
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Some(suffix) = raw.strip_prefix(LOCAL_PREFIX) {
            if let Ok(uuid) = Uuid::parse_str(suffix) {
                return Ok(Self::Local(uuid));
            }
        }
        Ok(Self::Remote(raw))
    }
}
