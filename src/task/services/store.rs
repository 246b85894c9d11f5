//! Authoritative in-memory task collection with optimistic mutation and
//! server reconciliation.
//!
//! Every mutation is applied locally before the network round trip and
//! tracked as a [`PendingMutation`]. Acknowledgements commit the optimistic
//! value with server-authoritative fields winning; failures restore the
//! pre-mutation snapshot. The collection is never left holding a value that
//! was neither optimistically proposed nor server-confirmed.

use crate::task::domain::{
    MutationKind, PendingMutation, SyncState, Task, TaskDomainError, TaskDraft, TaskId, TaskPatch,
};
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use crate::task::services::coordinator::SyncCoordinator;
use mockable::Clock;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;

/// Errors surfaced by store mutations.
#[derive(Debug, Error)]
pub enum TaskStoreError {
    /// Input validation failed before any request was issued.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The repository call failed; the optimistic change was rolled back.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// The task id is not present in the local collection.
    #[error("task not known locally: {0}")]
    UnknownTask(TaskId),

    /// The mutation was cancelled while queued because a delete for the same
    /// task superseded it; it was never sent.
    #[error("mutation superseded by a delete of task {0}")]
    Superseded(TaskId),
}

/// Result type for store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

#[derive(Debug, Default)]
struct StoreState {
    tasks: HashMap<TaskId, Task>,
    pending: HashMap<TaskId, VecDeque<PendingMutation>>,
    tombstones: HashMap<TaskId, Task>,
    aliases: HashMap<TaskId, TaskId>,
    next_seq: u64,
    refresh_epoch: u64,
    revision: u64,
}

/// Owner of the authoritative task collection.
///
/// The store applies mutations optimistically, serializes them per task id
/// through a [`SyncCoordinator`], reconciles server responses, and notifies
/// subscribers on every collection change. State is guarded by a synchronous
/// lock that is never held across an await, so reads never observe a
/// half-applied reconciliation.
pub struct TaskStore<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    coordinator: SyncCoordinator,
    state: Arc<Mutex<StoreState>>,
    changes: watch::Sender<u64>,
}

impl<R, C> Clone for TaskStore<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            coordinator: self.coordinator.clone(),
            state: Arc::clone(&self.state),
            changes: self.changes.clone(),
        }
    }
}

impl<R, C> TaskStore<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates an empty store over the given repository and clock.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        let (changes, _initial) = watch::channel(0);
        Self {
            repository,
            clock,
            coordinator: SyncCoordinator::new(),
            state: Arc::new(Mutex::new(StoreState::default())),
            changes,
        }
    }

    /// Returns a snapshot of the visible collection, ordered by id.
    ///
    /// Insertion order is irrelevant to the data model; id order makes the
    /// snapshot deterministic. Display order is imposed by the query engine.
    #[must_use]
    pub fn get_all(&self) -> Vec<Task> {
        let state = self.lock_state();
        let mut tasks: Vec<Task> = state.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.id().cmp(b.id()));
        tasks
    }

    /// Looks up a single task, following the local-to-remote id alias left
    /// behind by an acknowledged create.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        let state = self.lock_state();
        let canonical = resolve_id(&state, id);
        state.tasks.get(&canonical).cloned()
    }

    /// Returns the synchronization state of a task, or `None` when the id is
    /// unknown locally.
    #[must_use]
    pub fn sync_state(&self, id: &TaskId) -> Option<SyncState> {
        let state = self.lock_state();
        let canonical = resolve_id(&state, id);
        if !state.tasks.contains_key(&canonical) && !state.tombstones.contains_key(&canonical) {
            return None;
        }
        let sync = state.pending.get(&canonical).and_then(|entries| {
            entries.front().map(|front| SyncState::Pending {
                kind: front.kind(),
                depth: entries.len(),
            })
        });
        Some(sync.unwrap_or(SyncState::Committed))
    }

    /// Returns every mutation currently awaiting acknowledgement.
    #[must_use]
    pub fn pending_mutations(&self) -> Vec<PendingMutation> {
        let state = self.lock_state();
        let mut all: Vec<PendingMutation> = state
            .pending
            .values()
            .flat_map(|entries| entries.iter().cloned())
            .collect();
        all.sort_by_key(PendingMutation::seq);
        all
    }

    /// Subscribes to collection changes.
    ///
    /// The receiver yields a monotonically increasing revision; any change to
    /// the visible collection bumps it.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Creates a task optimistically.
    ///
    /// The record is visible to readers immediately under a placeholder id
    /// with no server timestamps. On acknowledgement it is atomically
    /// re-keyed under the server-assigned id; on failure it is removed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Repository`] when the server rejects the
    /// create; the optimistic record is gone by the time the error surfaces.
    pub async fn create(&self, draft: &TaskDraft) -> TaskStoreResult<Task> {
        let local_id = TaskId::local();
        let optimistic = Task::optimistic(draft, local_id.clone());
        let seq = {
            let mut state = self.lock_state();
            state.tasks.insert(local_id.clone(), optimistic);
            let issued = push_pending(&mut state, &local_id, MutationKind::Create, None, &*self.clock);
            self.bump_revision(&mut state);
            issued
        };

        let Some(_permit) = self.coordinator.admit(&local_id, MutationKind::Create).await else {
            // A create is the first mutation on its fresh lane, so
            // cancellation cannot occur; discard defensively if it does.
            self.discard_record(&local_id, seq);
            return Err(TaskStoreError::Superseded(local_id));
        };

        match self.repository.create(draft).await {
            Ok(server_task) => {
                let mut state = self.lock_state();
                let committed = commit_create(&mut state, &local_id, seq, server_task);
                self.bump_revision(&mut state);
                Ok(committed)
            }
            Err(err) => {
                self.discard_record(&local_id, seq);
                Err(err.into())
            }
        }
    }

    /// Patches a task optimistically.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::UnknownTask`] when the id is not in the
    /// collection, [`TaskStoreError::Superseded`] when a delete cancelled
    /// this mutation before it was sent, or [`TaskStoreError::Repository`]
    /// after rolling back to the pre-mutation snapshot.
    pub async fn update(&self, id: &TaskId, patch: &TaskPatch) -> TaskStoreResult<Task> {
        let (canonical, seq) = self.apply_optimistic(id, MutationKind::Update, |task, _now| {
            task.apply_patch(patch);
        })?;
        self.run_mutation(canonical, seq, MutationKind::Update, patch)
            .await
    }

    /// Flips a task's completion flag optimistically.
    ///
    /// The optimistic guess stamps `completed_at` from the injected clock;
    /// the server's value wins on acknowledgement.
    ///
    /// # Errors
    ///
    /// Same contract as [`TaskStore::update`].
    pub async fn toggle_complete(&self, id: &TaskId) -> TaskStoreResult<Task> {
        let (canonical, seq) = self.apply_optimistic(id, MutationKind::Toggle, |task, now| {
            task.set_completed(!task.is_completed(), now);
        })?;
        self.run_mutation(canonical, seq, MutationKind::Toggle, &TaskPatch::new())
            .await
    }

    /// Deletes a task optimistically.
    ///
    /// The record leaves the visible collection immediately and is retained
    /// as a tombstone until the server acknowledges. On failure the
    /// tombstone is reinserted; its position is unspecified since the
    /// collection is unordered (snapshots sort by id). A `NotFound` response
    /// discards the tombstone — the task was already gone server-side — and
    /// still surfaces the error so the caller can inform the user.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::UnknownTask`] when the id is not in the
    /// collection, or [`TaskStoreError::Repository`] on server failure.
    pub async fn remove(&self, id: &TaskId) -> TaskStoreResult<()> {
        let (canonical, seq) = {
            let mut state = self.lock_state();
            let canonical = resolve_id(&state, id);
            let Some(task) = state.tasks.remove(&canonical) else {
                return Err(TaskStoreError::UnknownTask(id.clone()));
            };
            state.tombstones.insert(canonical.clone(), task.clone());
            let issued = push_pending(
                &mut state,
                &canonical,
                MutationKind::Delete,
                Some(task),
                &*self.clock,
            );
            self.bump_revision(&mut state);
            (canonical, issued)
        };

        let Some(_permit) = self.coordinator.admit(&canonical, MutationKind::Delete).await else {
            // Deletes cancel only queued edits, never other deletes, so this
            // branch is unreachable; should it ever run, the tombstone must
            // go with the pending entry or the record would stay hidden from
            // every later refresh.
            self.discard_record(&canonical, seq);
            return Ok(());
        };

        let send_id = {
            let state = self.lock_state();
            resolve_id(&state, &canonical)
        };
        match self.repository.remove(&send_id).await {
            Ok(()) => {
                let mut state = self.lock_state();
                let resolved = resolve_id(&state, &canonical);
                remove_pending(&mut state, &resolved, seq);
                state.tombstones.remove(&resolved);
                self.bump_revision(&mut state);
                Ok(())
            }
            Err(err) => {
                self.settle_failure(&canonical, seq, &err);
                Err(err.into())
            }
        }
    }

    /// Replaces the committed collection with a fresh server listing.
    ///
    /// Used for the initial load and for manual retry after a fetch failure.
    /// Concurrent refreshes never interleave: the last refresh by issue time
    /// wins and a stale completion is ignored. Optimistic overlays — pending
    /// records, unacknowledged creates, and tombstones — survive the swap.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Repository`] when the listing fails; the
    /// collection is left untouched.
    pub async fn refresh(&self) -> TaskStoreResult<()> {
        let epoch = {
            let mut state = self.lock_state();
            state.refresh_epoch += 1;
            state.refresh_epoch
        };
        let listed = self.repository.list().await?;

        let mut state = self.lock_state();
        if state.refresh_epoch != epoch {
            // Superseded by a refresh issued after this one.
            return Ok(());
        }
        let mut next: HashMap<TaskId, Task> = listed
            .into_iter()
            .map(|task| (task.id().clone(), task))
            .collect();
        for id in state.tombstones.keys() {
            next.remove(id);
        }
        let overlays: Vec<TaskId> = state
            .tasks
            .keys()
            .filter(|id| id.is_local() || state.pending.contains_key(*id))
            .cloned()
            .collect();
        for id in overlays {
            if let Some(task) = state.tasks.get(&id) {
                next.insert(id.clone(), task.clone());
            }
        }
        state.tasks = next;
        self.bump_revision(&mut state);
        Ok(())
    }

    /// Applies an optimistic edit under the lock and registers its pending
    /// mutation, returning the canonical id and issue sequence.
    fn apply_optimistic<F>(
        &self,
        id: &TaskId,
        kind: MutationKind,
        edit: F,
    ) -> TaskStoreResult<(TaskId, u64)>
    where
        F: FnOnce(&mut Task, chrono::DateTime<chrono::Utc>),
    {
        let now = self.clock.utc();
        let mut state = self.lock_state();
        let canonical = resolve_id(&state, id);
        let Some(task) = state.tasks.get_mut(&canonical) else {
            return Err(TaskStoreError::UnknownTask(id.clone()));
        };
        let snapshot = task.clone();
        edit(task, now);
        let seq = push_pending(&mut state, &canonical, kind, Some(snapshot), &*self.clock);
        self.bump_revision(&mut state);
        Ok((canonical, seq))
    }

    /// Drives an already-applied optimistic edit through its lane and the
    /// repository, reconciling or rolling back.
    async fn run_mutation(
        &self,
        canonical: TaskId,
        seq: u64,
        kind: MutationKind,
        patch: &TaskPatch,
    ) -> TaskStoreResult<Task> {
        let Some(_permit) = self.coordinator.admit(&canonical, kind).await else {
            self.roll_back(&canonical, seq);
            return Err(TaskStoreError::Superseded(canonical));
        };

        let send_id = {
            let state = self.lock_state();
            resolve_id(&state, &canonical)
        };
        let outcome = match kind {
            MutationKind::Toggle => self.repository.toggle_complete(&send_id).await,
            _ => self.repository.update(&send_id, patch).await,
        };
        match outcome {
            Ok(server_task) => {
                let mut state = self.lock_state();
                let committed = reconcile_ack(
                    &mut state,
                    &canonical,
                    seq,
                    server_task,
                    kind == MutationKind::Toggle,
                );
                self.bump_revision(&mut state);
                Ok(committed)
            }
            Err(err) => {
                self.settle_failure(&canonical, seq, &err);
                Err(err.into())
            }
        }
    }

    /// Restores the pre-mutation snapshot for a failed or cancelled
    /// mutation.
    fn roll_back(&self, canonical: &TaskId, seq: u64) {
        let mut state = self.lock_state();
        let resolved = resolve_id(&state, canonical);
        let Some(entry) = remove_pending(&mut state, &resolved, seq) else {
            return;
        };
        let kind = entry.kind();
        if let Some(snapshot) = entry.into_rollback() {
            if kind == MutationKind::Delete {
                // Reinsert the tombstone into the visible collection. The
                // tombstone may carry server truth reconciled while the
                // delete was in flight, so it wins over the pre-delete
                // snapshot; position is unspecified, the collection is
                // unordered.
                let record = state.tombstones.remove(&resolved).unwrap_or(snapshot);
                state.tasks.insert(resolved.clone(), record);
            } else {
                restore_snapshot(&mut state, &resolved, snapshot);
            }
        }
        self.bump_revision(&mut state);
    }

    /// Applies the failure policy for an acknowledged error.
    ///
    /// `NotFound` discards the local record entirely — the task no longer
    /// exists server-side; every other failure rolls back to the snapshot.
    fn settle_failure(&self, canonical: &TaskId, seq: u64, err: &TaskRepositoryError) {
        if matches!(err, TaskRepositoryError::NotFound(_)) {
            self.discard_record(canonical, seq);
        } else {
            self.roll_back(canonical, seq);
        }
    }

    /// Removes a record and all its bookkeeping.
    fn discard_record(&self, canonical: &TaskId, seq: u64) {
        let mut state = self.lock_state();
        let resolved = resolve_id(&state, canonical);
        remove_pending(&mut state, &resolved, seq);
        state.tasks.remove(&resolved);
        state.tombstones.remove(&resolved);
        self.bump_revision(&mut state);
    }

    fn bump_revision(&self, state: &mut StoreState) {
        state.revision += 1;
        self.changes.send_replace(state.revision);
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Follows the local-to-remote alias left by an acknowledged create.
fn resolve_id(state: &StoreState, id: &TaskId) -> TaskId {
    state
        .aliases
        .get(id)
        .cloned()
        .unwrap_or_else(|| id.clone())
}

/// Registers a pending mutation, returning its issue sequence number.
fn push_pending(
    state: &mut StoreState,
    id: &TaskId,
    kind: MutationKind,
    rollback: Option<Task>,
    clock: &dyn Clock,
) -> u64 {
    state.next_seq += 1;
    let seq = state.next_seq;
    let entry = PendingMutation::new(seq, id.clone(), kind, rollback, clock.utc());
    state.pending.entry(id.clone()).or_default().push_back(entry);
    seq
}

/// Removes the pending mutation with the given sequence number.
fn remove_pending(state: &mut StoreState, id: &TaskId, seq: u64) -> Option<PendingMutation> {
    let entries = state.pending.get_mut(id)?;
    let position = entries.iter().position(|entry| entry.seq() == seq)?;
    let removed = entries.remove(position);
    if entries.is_empty() {
        state.pending.remove(id);
    }
    removed
}

/// Commits an acknowledged create: the placeholder record is atomically
/// re-keyed under the server id and the alias recorded for mutations that
/// were issued against the placeholder.
fn commit_create(state: &mut StoreState, local_id: &TaskId, seq: u64, server: Task) -> Task {
    let remote_id = server.id().clone();
    let mut entries = state.pending.remove(local_id).unwrap_or_default();
    entries.retain(|entry| entry.seq() != seq);
    let depth = entries.len();
    if depth > 0 {
        state.pending.insert(remote_id.clone(), entries);
    }
    state.aliases.insert(local_id.clone(), remote_id.clone());

    if let Some(stone) = state.tombstones.remove(local_id) {
        // A delete was issued before the create acknowledgement; keep the
        // record invisible and let the queued delete clear it.
        state.tombstones.insert(remote_id, stone);
        return server;
    }

    let current = state.tasks.remove(local_id);
    let committed = current.map_or_else(
        || server.clone(),
        |mut record| {
            if depth == 0 {
                server.clone()
            } else {
                record.merge_authoritative(&server, false);
                record
            }
        },
    );
    state.tasks.insert(remote_id, committed.clone());
    committed
}

/// Merges an acknowledged update or toggle into the local record.
///
/// When no later optimistic edits are stacked the server record is adopted
/// wholesale; otherwise only server-authoritative fields are merged so the
/// later edits are not clobbered.
fn reconcile_ack(
    state: &mut StoreState,
    canonical: &TaskId,
    seq: u64,
    server: Task,
    include_completion: bool,
) -> Task {
    let resolved = resolve_id(state, canonical);
    remove_pending(state, &resolved, seq);
    let depth = state.pending.get(&resolved).map_or(0, VecDeque::len);

    if let Some(task) = state.tasks.get_mut(&resolved) {
        if depth == 0 {
            *task = server;
        } else {
            task.merge_authoritative(&server, include_completion);
        }
        return task.clone();
    }
    if let Some(stone) = state.tombstones.get_mut(&resolved) {
        // Optimistically deleted while this mutation was in flight; keep the
        // tombstone reconciled so a failed delete reinserts server truth.
        if depth == 0 {
            *stone = server;
        } else {
            stone.merge_authoritative(&server, include_completion);
        }
        return stone.clone();
    }
    server
}

/// Puts a rollback snapshot back where the record currently lives.
fn restore_snapshot(state: &mut StoreState, id: &TaskId, snapshot: Task) {
    if let Some(stone) = state.tombstones.get_mut(id) {
        *stone = snapshot;
        return;
    }
    state.tasks.insert(id.clone(), snapshot);
}
