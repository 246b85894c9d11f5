//! End-to-end scenarios driving the store, coordinator, query engine, and
//! preference settings together against the in-memory server emulation.

use chrono::{Duration, Utc};
use mockable::DefaultClock;
use std::sync::Arc;
use taskdeck::task::{
    adapters::memory::{InMemoryPreferenceStore, InMemoryTaskRepository},
    domain::{Priority, QuerySpec, SortDirection, SortKey, StatusFilter, TaskDraft, TaskPatch},
    ports::TaskRepository,
    services::{query, QuerySettings, TaskStore},
};

type Store = TaskStore<InMemoryTaskRepository, DefaultClock>;

fn engine() -> (InMemoryTaskRepository, Store) {
    let repository = InMemoryTaskRepository::new();
    let store = TaskStore::new(Arc::new(repository.clone()), Arc::new(DefaultClock));
    (repository, store)
}

#[tokio::test(flavor = "multi_thread")]
async fn full_task_lifecycle_converges_with_server() -> eyre::Result<()> {
    let (repository, store) = engine();

    let milk = store
        .create(&TaskDraft::new("Buy milk")?.with_priority(Priority::High))
        .await?;
    assert!(!milk.id().is_local());

    let patch = TaskPatch::new()
        .with_title("Buy oat milk")?
        .with_description(Some("Two litres".to_owned()));
    let updated = store.update(milk.id(), &patch).await?;
    assert_eq!(updated.title(), "Buy oat milk");

    let completed = store.toggle_complete(milk.id()).await?;
    assert!(completed.is_completed());

    let rent = store.create(&TaskDraft::new("Pay rent")?).await?;
    store.remove(rent.id()).await?;

    assert_eq!(store.get_all(), repository.snapshot());
    assert!(store.pending_mutations().is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_delete_brings_the_task_back() -> eyre::Result<()> {
    let (repository, store) = engine();
    let milk = store.create(&TaskDraft::new("Buy milk")?).await?;

    repository.enqueue_failure(taskdeck::task::ports::TaskRepositoryError::Server(
        "500".to_owned(),
    ));
    let result = store.remove(milk.id()).await;
    assert!(result.is_err());

    let visible = store.get_all();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible.first().map(|task| task.title()), Some("Buy milk"));
    assert_eq!(store.get_all(), repository.snapshot());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn overdue_view_derives_from_live_collection() -> eyre::Result<()> {
    let (_repository, store) = engine();
    let now = Utc::now();

    store
        .create(&TaskDraft::new("File report")?.with_due_date(now - Duration::days(1)))
        .await?;
    store
        .create(&TaskDraft::new("Book dentist")?.with_due_date(now + Duration::days(1)))
        .await?;
    let done = store
        .create(&TaskDraft::new("Water plants")?.with_due_date(now - Duration::days(2)))
        .await?;
    store.toggle_complete(done.id()).await?;

    let spec = QuerySpec::new()
        .with_status(StatusFilter::Overdue)
        .with_sort(SortKey::DueDate, SortDirection::Asc);
    let visible = query::derive(&store.get_all(), &spec, Utc::now());
    let titles: Vec<&str> = visible.iter().map(|task| task.title()).collect();
    assert_eq!(titles, vec!["File report"]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn refresh_adopts_server_side_changes() -> eyre::Result<()> {
    let (repository, store) = engine();
    store.create(&TaskDraft::new("Buy milk")?).await?;

    // Another client adds a task behind this store's back.
    repository.create(&TaskDraft::new("Pay rent")?).await?;
    assert_eq!(store.get_all().len(), 1);

    store.refresh().await?;
    assert_eq!(store.get_all(), repository.snapshot());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn subscribers_observe_collection_changes() -> eyre::Result<()> {
    let (_repository, store) = engine();
    let mut changes = store.subscribe();
    let before = *changes.borrow();

    store.create(&TaskDraft::new("Buy milk")?).await?;
    changes.changed().await?;
    assert!(*changes.borrow() > before);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn persisted_selection_shapes_the_visible_sequence() -> eyre::Result<()> {
    let (_repository, store) = engine();
    store
        .create(&TaskDraft::new("Pay rent")?.with_priority(Priority::High))
        .await?;
    store
        .create(&TaskDraft::new("Sort photos")?.with_priority(Priority::Low))
        .await?;

    let preference_store = Arc::new(InMemoryPreferenceStore::new());
    let settings = QuerySettings::load(Arc::clone(&preference_store))?;
    settings.set(
        QuerySpec::new()
            .with_sort(SortKey::Priority, SortDirection::Desc)
            .with_search(""),
    )?;

    let reloaded = QuerySettings::load(preference_store)?;
    let visible = query::derive(&store.get_all(), &reloaded.current(), Utc::now());
    let titles: Vec<&str> = visible.iter().map(|task| task.title()).collect();
    assert_eq!(titles, vec!["Pay rent", "Sort photos"]);
    Ok(())
}
