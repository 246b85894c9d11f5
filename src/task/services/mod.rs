//! Orchestration services for task synchronization.

mod coordinator;
mod preferences;
pub mod query;
mod store;

pub use coordinator::{LanePermit, SyncCoordinator};
pub use preferences::QuerySettings;
pub use store::{TaskStore, TaskStoreError, TaskStoreResult};
