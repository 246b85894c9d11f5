//! Port contracts for task synchronization.
//!
//! Ports define infrastructure-agnostic interfaces used by the store and
//! preference services.

pub mod preferences;
pub mod repository;

pub use preferences::{PreferenceStore, PreferenceStoreError, PreferenceStoreResult};
pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
