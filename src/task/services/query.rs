//! Pure derivation of the visible task sequence.
//!
//! [`derive`] is referentially transparent: identical inputs always yield an
//! identical output sequence, which keeps it memoizable and deterministic to
//! test. It owns no state and never blocks.

use crate::task::domain::{QuerySpec, SortDirection, SortKey, StatusFilter, Task};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Derives the visible task sequence for a selection.
///
/// Filters apply in the order status, then priority, then search. The sort
/// is stable with ties broken by id ascending regardless of direction.
/// Missing optional sort values (`due_date` on undated tasks, `created_at`
/// on unacknowledged optimistic records) order after all defined values
/// ascending, and therefore before them descending.
#[must_use]
pub fn derive(tasks: &[Task], spec: &QuerySpec, now: DateTime<Utc>) -> Vec<Task> {
    let needle = spec.search_text().to_lowercase();
    let mut visible: Vec<Task> = tasks
        .iter()
        .filter(|task| matches_status(task, spec.status_filter(), now))
        .filter(|task| {
            spec.priority_filter()
                .is_none_or(|wanted| task.priority() == wanted)
        })
        .filter(|task| matches_search(task, &needle))
        .cloned()
        .collect();
    visible.sort_by(|a, b| compare(a, b, spec.sort_key(), spec.sort_direction()));
    visible
}

/// Reports whether a task passes the completion-status filter.
///
/// A task is overdue when its due date has passed and it is not completed.
fn matches_status(task: &Task, filter: StatusFilter, now: DateTime<Utc>) -> bool {
    match filter {
        StatusFilter::All => true,
        StatusFilter::Active => !task.is_completed(),
        StatusFilter::Completed => task.is_completed(),
        StatusFilter::Overdue => {
            !task.is_completed() && task.due_date().is_some_and(|due| due < now)
        }
    }
}

/// Case-insensitive substring match over title and description.
///
/// An empty needle matches everything.
fn matches_search(task: &Task, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return true;
    }
    if task.title().to_lowercase().contains(needle_lower) {
        return true;
    }
    task.description()
        .is_some_and(|description| description.to_lowercase().contains(needle_lower))
}

/// Orders two tasks by the selected key and direction, breaking ties by id
/// ascending so the sequence is deterministic.
fn compare(a: &Task, b: &Task, key: SortKey, direction: SortDirection) -> Ordering {
    let primary = match key {
        SortKey::DueDate => compare_optional(a.due_date(), b.due_date()),
        SortKey::Priority => a.priority().cmp(&b.priority()),
        SortKey::CreatedAt => compare_optional(a.created_at(), b.created_at()),
        SortKey::Title => a.title().to_lowercase().cmp(&b.title().to_lowercase()),
    };
    let oriented = match direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    oriented.then_with(|| a.id().cmp(b.id()))
}

/// Orders optional timestamps with `None` greatest, so undefined values land
/// last ascending and first descending.
fn compare_optional(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(lhs), Some(rhs)) => lhs.cmp(&rhs),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
