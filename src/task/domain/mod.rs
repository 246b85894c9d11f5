//! Domain model for client-side task synchronization.
//!
//! The domain models the task entity, validated creation and update
//! payloads, the optimistic-mutation bookkeeping that makes rollback total,
//! and the query selection, while keeping all infrastructure concerns
//! outside of the domain boundary.

mod error;
mod ids;
mod pending;
mod query;
mod task;

pub use error::{ParsePriorityError, TaskDomainError};
pub use ids::TaskId;
pub use pending::{MutationKind, PendingMutation, SyncState};
pub use query::{QuerySpec, SortDirection, SortKey, StatusFilter};
pub use task::{Priority, RemoteTaskData, Task, TaskDraft, TaskPatch};
