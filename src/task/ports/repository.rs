//! Repository port for the remote task API boundary.

use crate::task::domain::{Task, TaskDraft, TaskId, TaskPatch};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Remote CRUD contract for tasks.
///
/// Each operation maps to exactly one network round trip. Implementations
/// perform pure request/response mapping, hold no state, never retry, and
/// never swallow errors.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Fetches the full task collection.
    async fn list(&self) -> TaskRepositoryResult<Vec<Task>>;

    /// Creates a task; the server assigns the identifier and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Validation`] when the server rejects
    /// the payload.
    async fn create(&self, draft: &TaskDraft) -> TaskRepositoryResult<Task>;

    /// Applies a partial update, returning the server's updated record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the identifier is
    /// unknown, typically due to a prior deletion.
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> TaskRepositoryResult<Task>;

    /// Flips the completion flag, returning the server's updated record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the identifier is
    /// unknown.
    async fn toggle_complete(&self, id: &TaskId) -> TaskRepositoryResult<Task>;

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the identifier is
    /// unknown.
    async fn remove(&self, id: &TaskId) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The server rejected the payload with a field-level cause.
    #[error("validation failed on field '{field}': {message}")]
    Validation {
        /// The rejected field.
        field: String,
        /// Human-readable cause, retained for display until the next attempt.
        message: String,
    },

    /// The task does not exist server-side.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The server failed (5xx-class).
    #[error("server error: {0}")]
    Server(String),

    /// The transport failed before a server response arrived.
    #[error("network error: {0}")]
    Network(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Creates a validation error for a single field.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Wraps a transport error.
    #[must_use]
    pub fn network(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Network(Arc::new(err))
    }

    /// Reports whether manually retrying the same operation could succeed.
    ///
    /// Validation and not-found failures are terminal: resending the same
    /// request cannot change the outcome.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Server(_) | Self::Network(_))
    }
}
