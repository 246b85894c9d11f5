//! Preference port for persisting the last chosen query selection.

use crate::task::domain::QuerySpec;
use thiserror::Error;

/// Result type for preference store operations.
pub type PreferenceStoreResult<T> = Result<T, PreferenceStoreError>;

/// Persistence contract for the user's last query selection.
///
/// The core depends only on this get/set capability, not on a specific
/// storage medium; adapters decide where the selection lives.
pub trait PreferenceStore: Send + Sync {
    /// Loads the persisted selection, or `None` when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceStoreError`] when the medium fails or holds an
    /// unreadable value.
    fn load(&self) -> PreferenceStoreResult<Option<QuerySpec>>;

    /// Persists the selection, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceStoreError`] when the medium rejects the write.
    fn save(&self, spec: &QuerySpec) -> PreferenceStoreResult<()>;
}

/// Errors returned by preference store implementations.
#[derive(Debug, Error)]
pub enum PreferenceStoreError {
    /// The stored value could not be encoded or decoded.
    #[error("preference serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage medium failed.
    #[error("preference storage failed: {0}")]
    Storage(#[from] std::io::Error),
}
