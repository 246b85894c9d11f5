//! Filter, sort, and search selection driving the visible task sequence.

use super::Priority;
use serde::{Deserialize, Serialize};

/// Completion-status filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Every task.
    #[default]
    All,
    /// Tasks not yet completed.
    Active,
    /// Completed tasks.
    Completed,
    /// Uncompleted tasks whose due date has passed.
    Overdue,
}

impl StatusFilter {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
        }
    }
}

/// Field the visible sequence is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Order by due date.
    DueDate,
    /// Order by priority (ordinal).
    Priority,
    /// Order by server creation time.
    #[default]
    CreatedAt,
    /// Order by title, case-insensitively.
    Title,
}

impl SortKey {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DueDate => "due_date",
            Self::Priority => "priority",
            Self::CreatedAt => "created_at",
            Self::Title => "title",
        }
    }
}

/// Direction of the sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// The filter + sort + search selection.
///
/// Owned by the preference layer and read-only to the query engine. Every
/// field carries a serde default so persisted selections from older versions
/// still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuerySpec {
    status_filter: StatusFilter,
    priority_filter: Option<Priority>,
    sort_key: SortKey,
    sort_direction: SortDirection,
    search_text: String,
}

impl QuerySpec {
    /// Creates the default selection: all tasks, creation order, no search.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status filter.
    #[must_use]
    pub const fn with_status(mut self, status_filter: StatusFilter) -> Self {
        self.status_filter = status_filter;
        self
    }

    /// Restricts to a single priority; `None` matches every priority.
    #[must_use]
    pub const fn with_priority(mut self, priority_filter: Option<Priority>) -> Self {
        self.priority_filter = priority_filter;
        self
    }

    /// Sets the sort key and direction.
    #[must_use]
    pub const fn with_sort(mut self, sort_key: SortKey, sort_direction: SortDirection) -> Self {
        self.sort_key = sort_key;
        self.sort_direction = sort_direction;
        self
    }

    /// Sets the free-text search, matched case-insensitively against title
    /// and description.
    #[must_use]
    pub fn with_search(mut self, search_text: impl Into<String>) -> Self {
        self.search_text = search_text.into();
        self
    }

    /// Returns the status filter.
    #[must_use]
    pub const fn status_filter(&self) -> StatusFilter {
        self.status_filter
    }

    /// Returns the priority filter.
    #[must_use]
    pub const fn priority_filter(&self) -> Option<Priority> {
        self.priority_filter
    }

    /// Returns the sort key.
    #[must_use]
    pub const fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    /// Returns the sort direction.
    #[must_use]
    pub const fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    /// Returns the search text.
    #[must_use]
    pub fn search_text(&self) -> &str {
        &self.search_text
    }
}
