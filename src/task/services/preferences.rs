//! Query selection lifecycle over a preference store.

use crate::task::domain::QuerySpec;
use crate::task::ports::{PreferenceStore, PreferenceStoreResult};
use std::sync::{Arc, Mutex, PoisonError};

/// Holds the current query selection and persists every change.
///
/// Loads once at startup and saves on change; the query engine reads the
/// cached selection without touching the storage medium.
pub struct QuerySettings<P>
where
    P: PreferenceStore,
{
    store: Arc<P>,
    current: Mutex<QuerySpec>,
}

impl<P> QuerySettings<P>
where
    P: PreferenceStore,
{
    /// Loads the last persisted selection, falling back to the default.
    ///
    /// # Errors
    ///
    /// Returns the store's error when the persisted value cannot be read.
    pub fn load(store: Arc<P>) -> PreferenceStoreResult<Self> {
        let current = store.load()?.unwrap_or_default();
        Ok(Self {
            store,
            current: Mutex::new(current),
        })
    }

    /// Returns the current selection.
    #[must_use]
    pub fn current(&self) -> QuerySpec {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the selection, persisting it before the cache is updated so
    /// a failed write leaves the previous selection in effect.
    ///
    /// # Errors
    ///
    /// Returns the store's error when persisting fails.
    pub fn set(&self, spec: QuerySpec) -> PreferenceStoreResult<()> {
        self.store.save(&spec)?;
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current = spec;
        Ok(())
    }
}
