//! Optimistic mutation bookkeeping.
//!
//! Every mutation issued against the remote API is tracked from issue to
//! acknowledgement. Rollback logic is total over these variants: a record is
//! either committed (matches the last server-confirmed value) or pending
//! (carries optimistic changes with a snapshot to restore on failure).

use super::{Task, TaskId};
use chrono::{DateTime, Utc};
use std::fmt;

/// Kind of mutation issued against the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Create a new task.
    Create,
    /// Patch fields of an existing task.
    Update,
    /// Flip the completion flag.
    Toggle,
    /// Delete a task.
    Delete,
}

impl MutationKind {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Toggle => "toggle",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An optimistic change awaiting server acknowledgement.
///
/// Created when a mutation is issued and destroyed on acknowledgement:
/// success commits the optimistic value, failure restores the rollback
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    seq: u64,
    task_id: TaskId,
    kind: MutationKind,
    rollback: Option<Task>,
    issued_at: DateTime<Utc>,
}

impl PendingMutation {
    /// Records a newly issued mutation.
    #[must_use]
    pub const fn new(
        seq: u64,
        task_id: TaskId,
        kind: MutationKind,
        rollback: Option<Task>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            seq,
            task_id,
            kind,
            rollback,
            issued_at,
        }
    }

    /// Returns the store-wide issue sequence number.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns the target task identifier.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the mutation kind.
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        self.kind
    }

    /// Returns the pre-mutation snapshot, absent for creates.
    #[must_use]
    pub const fn rollback(&self) -> Option<&Task> {
        self.rollback.as_ref()
    }

    /// Returns the timestamp the mutation was issued.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Consumes the record, yielding the rollback snapshot.
    #[must_use]
    pub fn into_rollback(self) -> Option<Task> {
        self.rollback
    }
}

/// Synchronization state of a task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// The record matches the last server-confirmed value.
    Committed,
    /// The record carries optimistic changes awaiting acknowledgement.
    Pending {
        /// Kind of the mutation that will be acknowledged next.
        kind: MutationKind,
        /// Mutations awaiting acknowledgement, in flight plus queued.
        depth: usize,
    },
}
