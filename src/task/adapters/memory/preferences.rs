//! In-memory preference store for tests and ephemeral sessions.

use crate::task::domain::QuerySpec;
use crate::task::ports::{PreferenceStore, PreferenceStoreResult};
use std::sync::{Arc, Mutex, PoisonError};

/// Preference store that keeps the selection in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPreferenceStore {
    value: Arc<Mutex<Option<QuerySpec>>>,
}

impl InMemoryPreferenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn load(&self) -> PreferenceStoreResult<Option<QuerySpec>> {
        let value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(value.clone())
    }

    fn save(&self, spec: &QuerySpec) -> PreferenceStoreResult<()> {
        let mut value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        *value = Some(spec.clone());
        Ok(())
    }
}
