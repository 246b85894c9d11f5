//! Lane admission and ordering tests for the sync coordinator.

use crate::task::domain::{MutationKind, TaskId};
use crate::task::services::SyncCoordinator;
use rstest::{fixture, rstest};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, timeout};

const SHORT: Duration = Duration::from_millis(50);

#[fixture]
fn coordinator() -> SyncCoordinator {
    SyncCoordinator::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn different_ids_admit_in_parallel(coordinator: SyncCoordinator) {
    let first = TaskId::remote("1");
    let second = TaskId::remote("2");
    let _held = coordinator
        .admit(&first, MutationKind::Update)
        .await
        .expect("first lane admits");
    let other = timeout(SHORT, coordinator.admit(&second, MutationKind::Update))
        .await
        .expect("independent lane must not wait");
    assert!(other.is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn same_id_waits_until_permit_released(coordinator: SyncCoordinator) {
    let id = TaskId::remote("1");
    let held = coordinator
        .admit(&id, MutationKind::Update)
        .await
        .expect("lane admits");
    let blocked = timeout(SHORT, coordinator.admit(&id, MutationKind::Update)).await;
    assert!(blocked.is_err(), "second mutation must queue");

    drop(held);
    let admitted = timeout(SHORT, coordinator.admit(&id, MutationKind::Update))
        .await
        .expect("released lane admits");
    assert!(admitted.is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn queued_mutations_admit_in_issue_order(coordinator: SyncCoordinator) {
    let id = TaskId::remote("1");
    let order: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let held = coordinator
        .admit(&id, MutationKind::Update)
        .await
        .expect("lane admits");

    let mut handles = Vec::new();
    for label in 1..=3_u32 {
        let lane_coordinator = coordinator.clone();
        let lane_id = id.clone();
        let lane_order = Arc::clone(&order);
        handles.push(tokio::spawn(async move {
            let permit = lane_coordinator
                .admit(&lane_id, MutationKind::Update)
                .await
                .expect("queued mutation admits");
            lane_order.lock().expect("order lock").push(label);
            drop(permit);
        }));
        // Give each contender time to enqueue before the next is issued.
        sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(coordinator.queued_len(&id), 3);

    drop(held);
    for handle in handles {
        handle.await.expect("queued mutation completes");
    }
    assert_eq!(*order.lock().expect("order lock"), vec![1, 2, 3]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_cancels_queued_edits_but_not_deletes(coordinator: SyncCoordinator) {
    let id = TaskId::remote("1");
    let held = coordinator
        .admit(&id, MutationKind::Update)
        .await
        .expect("lane admits");

    let queued_coordinator = coordinator.clone();
    let queued_id = id.clone();
    let queued_edit = tokio::spawn(async move {
        queued_coordinator
            .admit(&queued_id, MutationKind::Toggle)
            .await
    });
    sleep(Duration::from_millis(20)).await;

    let delete_coordinator = coordinator.clone();
    let delete_id = id.clone();
    let queued_delete =
        tokio::spawn(async move { delete_coordinator.admit(&delete_id, MutationKind::Delete).await });
    sleep(Duration::from_millis(20)).await;

    // The queued edit is dropped without being sent, even while the lane is
    // still busy with the in-flight mutation.
    let cancelled = queued_edit.await.expect("queued edit resolves");
    assert!(cancelled.is_none());

    drop(held);
    let admitted = queued_delete.await.expect("queued delete resolves");
    assert!(admitted.is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn abandoned_waiter_does_not_wedge_the_lane(coordinator: SyncCoordinator) {
    let id = TaskId::remote("1");
    let held = coordinator
        .admit(&id, MutationKind::Update)
        .await
        .expect("lane admits");
    // Queue a waiter, then abandon it by dropping its admit future.
    let abandoned = timeout(SHORT, coordinator.admit(&id, MutationKind::Update)).await;
    assert!(abandoned.is_err());

    drop(held);
    let admitted = timeout(SHORT, coordinator.admit(&id, MutationKind::Update))
        .await
        .expect("lane recovers from abandoned waiter");
    assert!(admitted.is_some());
}
