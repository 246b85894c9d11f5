//! Per-task serialization of mutations against the remote API.
//!
//! Each task id owns a lane. A lane admits at most one mutation at a time;
//! contenders wait in a FIFO queue and are admitted strictly in issue order,
//! which prevents a slow update and a fast delete issued back to back from
//! reordering at the server. Lanes for different ids are independent, so
//! mutations on different tasks proceed fully in parallel.

use crate::task::domain::{MutationKind, TaskId};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// Decision delivered to a queued waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Proceed,
    Cancelled,
}

/// A mutation waiting for its lane.
#[derive(Debug)]
struct Waiter {
    kind: MutationKind,
    slot: oneshot::Sender<Admission>,
}

/// Admission state for a single task id.
#[derive(Debug, Default)]
struct Lane {
    busy: bool,
    queue: VecDeque<Waiter>,
}

impl Lane {
    /// Cancels queued edits when a delete joins the lane.
    ///
    /// A queued update or toggle for a task that is about to be deleted is
    /// dropped without being sent; queued deletes are kept in order.
    fn cancel_queued_edits(&mut self) {
        let mut kept = VecDeque::with_capacity(self.queue.len());
        for waiter in self.queue.drain(..) {
            if waiter.kind == MutationKind::Delete {
                kept.push_back(waiter);
            } else {
                waiter.slot.send(Admission::Cancelled).ok();
            }
        }
        self.queue = kept;
    }
}

type LaneMap = HashMap<TaskId, Lane>;

/// Serializes mutations so that at most one request per task id is in
/// flight at any moment.
#[derive(Debug, Clone, Default)]
pub struct SyncCoordinator {
    lanes: Arc<Mutex<LaneMap>>,
}

impl SyncCoordinator {
    /// Creates a coordinator with no lanes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the lane of `id`, returning a permit once this mutation may
    /// be sent.
    ///
    /// Returns `None` when the mutation was cancelled while queued: a delete
    /// joined the lane behind it and superseded the edit. The caller must
    /// hold the returned permit across its repository call; dropping the
    /// permit hands the lane to the next waiter.
    pub async fn admit(&self, id: &TaskId, kind: MutationKind) -> Option<LanePermit> {
        let pending_slot = {
            let mut lanes = lock_lanes(&self.lanes);
            let lane = lanes.entry(id.clone()).or_default();
            if kind == MutationKind::Delete {
                lane.cancel_queued_edits();
            }
            if lane.busy {
                let (sender, receiver) = oneshot::channel();
                lane.queue.push_back(Waiter { kind, slot: sender });
                Some(receiver)
            } else {
                lane.busy = true;
                None
            }
        };

        match pending_slot {
            None => Some(LanePermit::new(Arc::clone(&self.lanes), id.clone())),
            Some(receiver) => match receiver.await {
                Ok(Admission::Proceed) => {
                    Some(LanePermit::new(Arc::clone(&self.lanes), id.clone()))
                }
                Ok(Admission::Cancelled) | Err(_) => None,
            },
        }
    }

    /// Reports how many mutations are waiting behind the in-flight one.
    #[must_use]
    pub fn queued_len(&self, id: &TaskId) -> usize {
        let lanes = lock_lanes(&self.lanes);
        lanes.get(id).map_or(0, |lane| lane.queue.len())
    }
}

/// Exclusive right to send one mutation for a task id.
///
/// Dropping the permit releases the lane: the next live waiter is admitted,
/// or the lane is removed once drained.
#[derive(Debug)]
pub struct LanePermit {
    lanes: Arc<Mutex<LaneMap>>,
    id: TaskId,
}

impl LanePermit {
    const fn new(lanes: Arc<Mutex<LaneMap>>, id: TaskId) -> Self {
        Self { lanes, id }
    }
}

impl Drop for LanePermit {
    fn drop(&mut self) {
        let mut lanes = lock_lanes(&self.lanes);
        let drained = match lanes.get_mut(&self.id) {
            None => false,
            Some(lane) => hand_over(lane),
        };
        if drained {
            lanes.remove(&self.id);
        }
    }
}

/// Admits the next live waiter; returns true when the lane emptied.
fn hand_over(lane: &mut Lane) -> bool {
    while let Some(waiter) = lane.queue.pop_front() {
        // A waiter whose admit future was dropped has a closed slot; skip it.
        if waiter.slot.send(Admission::Proceed).is_ok() {
            return false;
        }
    }
    lane.busy = false;
    true
}

/// Locks the lane map, recovering from a poisoned lock.
fn lock_lanes(lanes: &Mutex<LaneMap>) -> std::sync::MutexGuard<'_, LaneMap> {
    lanes.lock().unwrap_or_else(PoisonError::into_inner)
}
