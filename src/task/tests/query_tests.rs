//! Determinism, filtering, and ordering tests for query derivation.

use super::fixtures::{base_time, remote_data};
use crate::task::domain::{
    Priority, QuerySpec, SortDirection, SortKey, StatusFilter, Task, TaskId,
};
use crate::task::services::query::derive;
use chrono::Duration;
use rstest::{fixture, rstest};

fn task_due(id: &str, title: &str, due_offset_days: Option<i64>) -> Task {
    let mut data = remote_data(id, title);
    data.due_date = due_offset_days.map(|days| base_time() + Duration::days(days));
    Task::from_remote(data)
}

#[fixture]
fn mixed_tasks() -> Vec<Task> {
    let mut overdue = remote_data("1", "Pay rent");
    overdue.due_date = Some(base_time() - Duration::days(1));
    overdue.priority = Priority::High;

    let mut upcoming = remote_data("2", "Book dentist");
    upcoming.due_date = Some(base_time() + Duration::days(1));
    upcoming.description = Some("Ask about the molar".to_owned());

    let mut done = remote_data("3", "Water plants");
    done.completed = true;
    done.completed_at = Some(base_time());
    done.priority = Priority::Low;

    let undated = remote_data("4", "Sort photos");

    vec![
        Task::from_remote(overdue),
        Task::from_remote(upcoming),
        Task::from_remote(done),
        Task::from_remote(undated),
    ]
}

#[rstest]
fn derive_is_deterministic(mixed_tasks: Vec<Task>) {
    let spec = QuerySpec::new()
        .with_status(StatusFilter::Active)
        .with_sort(SortKey::DueDate, SortDirection::Asc)
        .with_search("o");
    let first = derive(&mixed_tasks, &spec, base_time());
    let second = derive(&mixed_tasks, &spec, base_time());
    assert_eq!(first, second);
}

#[rstest]
fn overdue_includes_just_past_due_and_excludes_completed() {
    let mut data = remote_data("1", "File report");
    data.due_date = Some(base_time() - Duration::seconds(1));
    let open_task = Task::from_remote(data.clone());

    data.completed = true;
    data.completed_at = Some(base_time());
    let done_task = Task::from_remote(data);

    let spec = QuerySpec::new().with_status(StatusFilter::Overdue);
    let open_visible = derive(std::slice::from_ref(&open_task), &spec, base_time());
    assert_eq!(open_visible, vec![open_task]);
    let done_visible = derive(std::slice::from_ref(&done_task), &spec, base_time());
    assert!(done_visible.is_empty());
}

#[rstest]
fn overdue_selection_returns_exactly_the_overdue_task() {
    // Due yesterday, due tomorrow, and undated; only the first qualifies.
    let tasks = vec![
        task_due("1", "Yesterday", Some(-1)),
        task_due("2", "Tomorrow", Some(1)),
        task_due("3", "Whenever", None),
    ];
    let spec = QuerySpec::new()
        .with_status(StatusFilter::Overdue)
        .with_sort(SortKey::DueDate, SortDirection::Asc);
    let visible = derive(&tasks, &spec, base_time());
    let ids: Vec<&TaskId> = visible.iter().map(Task::id).collect();
    assert_eq!(ids, vec![&TaskId::remote("1")]);
}

#[rstest]
fn search_matches_title_and_description_case_insensitively(mixed_tasks: Vec<Task>) {
    let by_title = derive(
        &mixed_tasks,
        &QuerySpec::new().with_search("PAY"),
        base_time(),
    );
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title.first().map(Task::title), Some("Pay rent"));

    let by_description = derive(
        &mixed_tasks,
        &QuerySpec::new().with_search("molar"),
        base_time(),
    );
    assert_eq!(by_description.len(), 1);
    assert_eq!(by_description.first().map(Task::title), Some("Book dentist"));
}

#[rstest]
fn empty_search_matches_everything(mixed_tasks: Vec<Task>) {
    let visible = derive(&mixed_tasks, &QuerySpec::new(), base_time());
    assert_eq!(visible.len(), mixed_tasks.len());
}

#[rstest]
fn priority_filter_narrows_results(mixed_tasks: Vec<Task>) {
    let spec = QuerySpec::new().with_priority(Some(Priority::High));
    let visible = derive(&mixed_tasks, &spec, base_time());
    assert_eq!(visible.len(), 1);
    assert_eq!(visible.first().map(Task::title), Some("Pay rent"));
}

#[rstest]
fn priority_sort_is_ordinal(mixed_tasks: Vec<Task>) {
    let spec = QuerySpec::new().with_sort(SortKey::Priority, SortDirection::Desc);
    let visible = derive(&mixed_tasks, &spec, base_time());
    let priorities: Vec<Priority> = visible.iter().map(Task::priority).collect();
    assert_eq!(
        priorities,
        vec![
            Priority::High,
            Priority::Medium,
            Priority::Medium,
            Priority::Low
        ]
    );
}

#[rstest]
fn missing_due_date_sorts_last_ascending_and_first_descending() {
    let tasks = vec![
        task_due("1", "Dated", Some(2)),
        task_due("2", "Undated", None),
        task_due("3", "Sooner", Some(1)),
    ];
    let ascending = derive(
        &tasks,
        &QuerySpec::new().with_sort(SortKey::DueDate, SortDirection::Asc),
        base_time(),
    );
    let asc_ids: Vec<&TaskId> = ascending.iter().map(Task::id).collect();
    assert_eq!(
        asc_ids,
        vec![
            &TaskId::remote("3"),
            &TaskId::remote("1"),
            &TaskId::remote("2")
        ]
    );

    let descending = derive(
        &tasks,
        &QuerySpec::new().with_sort(SortKey::DueDate, SortDirection::Desc),
        base_time(),
    );
    let desc_ids: Vec<&TaskId> = descending.iter().map(Task::id).collect();
    assert_eq!(
        desc_ids,
        vec![
            &TaskId::remote("2"),
            &TaskId::remote("1"),
            &TaskId::remote("3")
        ]
    );
}

#[rstest]
fn ties_break_by_id_ascending_regardless_of_direction() {
    let tasks = vec![
        task_due("2", "Same", None),
        task_due("1", "Same", None),
        task_due("3", "Same", None),
    ];
    for direction in [SortDirection::Asc, SortDirection::Desc] {
        let spec = QuerySpec::new().with_sort(SortKey::Title, direction);
        let visible = derive(&tasks, &spec, base_time());
        let ids: Vec<&TaskId> = visible.iter().map(Task::id).collect();
        assert_eq!(
            ids,
            vec![
                &TaskId::remote("1"),
                &TaskId::remote("2"),
                &TaskId::remote("3")
            ]
        );
    }
}

#[rstest]
fn title_sort_ignores_case() {
    let tasks = vec![
        task_due("1", "zebra", None),
        task_due("2", "Apple", None),
        task_due("3", "mango", None),
    ];
    let spec = QuerySpec::new().with_sort(SortKey::Title, SortDirection::Asc);
    let visible = derive(&tasks, &spec, base_time());
    let titles: Vec<&str> = visible.iter().map(Task::title).collect();
    assert_eq!(titles, vec!["Apple", "mango", "zebra"]);
}

#[rstest]
fn filters_compose_status_then_priority_then_search(mixed_tasks: Vec<Task>) {
    let spec = QuerySpec::new()
        .with_status(StatusFilter::Active)
        .with_priority(Some(Priority::Medium))
        .with_search("dentist");
    let visible = derive(&mixed_tasks, &spec, base_time());
    assert_eq!(visible.len(), 1);
    assert_eq!(visible.first().map(Task::title), Some("Book dentist"));
}
