//! In-memory repository emulating the remote task API.
//!
//! Implements the full server contract — sequential opaque identifiers,
//! server-authored timestamps, empty-title validation, not-found responses —
//! plus scripted failure injection and an operation log so tests can assert
//! request ordering.

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::task::{
    domain::{RemoteTaskData, Task, TaskDraft, TaskId, TaskPatch},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

#[derive(Debug, Default)]
struct RemoteState {
    tasks: HashMap<TaskId, Task>,
    next_id: u64,
    failures: VecDeque<TaskRepositoryError>,
    operations: Vec<String>,
}

/// Thread-safe in-memory task repository behaving like the remote server.
///
/// Clones share the server-side collection, so a test can hand one clone to
/// the store and keep another for seeding and assertions.
#[derive(Debug)]
pub struct InMemoryTaskRepository<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    clock: Arc<C>,
    state: Arc<Mutex<RemoteState>>,
}

impl<C> Clone for InMemoryTaskRepository<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            clock: Arc::clone(&self.clock),
            state: Arc::clone(&self.state),
        }
    }
}

impl InMemoryTaskRepository<DefaultClock> {
    /// Creates an empty repository using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryTaskRepository<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> InMemoryTaskRepository<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty repository with an injected clock.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(RemoteState::default())),
        }
    }

    /// Inserts server-confirmed tasks directly, bypassing the API contract.
    pub fn seed(&self, tasks: impl IntoIterator<Item = Task>) {
        let mut state = self.lock_state();
        for task in tasks {
            state.tasks.insert(task.id().clone(), task);
        }
    }

    /// Scripts the next operation to fail with the given error.
    ///
    /// Queued failures apply in order, one per operation, before the
    /// operation touches the collection.
    pub fn enqueue_failure(&self, err: TaskRepositoryError) {
        let mut state = self.lock_state();
        state.failures.push_back(err);
    }

    /// Returns the operations that reached the server, in send order.
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        let state = self.lock_state();
        state.operations.clone()
    }

    /// Returns the server-side collection, ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        let state = self.lock_state();
        let mut tasks: Vec<Task> = state.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.id().cmp(b.id()));
        tasks
    }

    fn lock_state(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the operation and pops a scripted failure if one is queued.
    fn begin(state: &mut RemoteState, operation: String) -> TaskRepositoryResult<()> {
        state.operations.push(operation);
        state.failures.pop_front().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl<C> TaskRepository for InMemoryTaskRepository<C>
where
    C: Clock + Send + Sync,
{
    async fn list(&self) -> TaskRepositoryResult<Vec<Task>> {
        let mut state = self.lock_state();
        Self::begin(&mut state, "list".to_owned())?;
        let mut tasks: Vec<Task> = state.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(tasks)
    }

    async fn create(&self, draft: &TaskDraft) -> TaskRepositoryResult<Task> {
        let now = self.clock.utc();
        let mut state = self.lock_state();
        Self::begin(&mut state, "create".to_owned())?;
        if draft.title().trim().is_empty() {
            return Err(TaskRepositoryError::validation(
                "title",
                "title must not be empty",
            ));
        }
        state.next_id += 1;
        let task = Task::from_remote(RemoteTaskData {
            id: TaskId::remote(state.next_id.to_string()),
            title: draft.title().to_owned(),
            description: draft.description().map(ToOwned::to_owned),
            completed: false,
            priority: draft.priority(),
            due_date: draft.due_date(),
            completed_at: None,
            created_at: now,
            updated_at: now,
        });
        state.tasks.insert(task.id().clone(), task.clone());
        Ok(task)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> TaskRepositoryResult<Task> {
        let now = self.clock.utc();
        let mut state = self.lock_state();
        Self::begin(&mut state, format!("update {id}"))?;
        if patch.title().is_some_and(|title| title.trim().is_empty()) {
            return Err(TaskRepositoryError::validation(
                "title",
                "title must not be empty",
            ));
        }
        let task = state
            .tasks
            .get_mut(id)
            .ok_or_else(|| TaskRepositoryError::NotFound(id.clone()))?;
        task.apply_patch(patch);
        task.touch_updated(now);
        Ok(task.clone())
    }

    async fn toggle_complete(&self, id: &TaskId) -> TaskRepositoryResult<Task> {
        let now = self.clock.utc();
        let mut state = self.lock_state();
        Self::begin(&mut state, format!("toggle {id}"))?;
        let task = state
            .tasks
            .get_mut(id)
            .ok_or_else(|| TaskRepositoryError::NotFound(id.clone()))?;
        task.set_completed(!task.is_completed(), now);
        task.touch_updated(now);
        Ok(task.clone())
    }

    async fn remove(&self, id: &TaskId) -> TaskRepositoryResult<()> {
        let mut state = self.lock_state();
        Self::begin(&mut state, format!("delete {id}"))?;
        state
            .tasks
            .remove(id)
            .map(|_removed| ())
            .ok_or_else(|| TaskRepositoryError::NotFound(id.clone()))
    }
}
