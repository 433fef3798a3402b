//! Filtered, sorted projection of the task collection.
//!
//! [`derive`] is pure: the same collection and [`FilterState`] always give
//! the same [`DerivedView`]. Summary counts and the status list are computed
//! over the whole collection, not the filtered rows.

use std::cmp::Ordering;

use taskboard_proto::task::{Task, TaskStatus, parse_due_date};

/// Column the rows are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Keep collection order.
    #[default]
    None,
    /// Earliest due date first.
    DueDate,
    /// Most urgent first.
    Priority,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Natural order of the field.
    #[default]
    Asc,
    /// Reverse of the natural order.
    Desc,
}

impl SortOrder {
    /// Returns the other direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Search, filter and sort settings chosen by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Case-insensitive substring matched against title, assignee and status.
    pub search_text: String,
    /// Only rows with this status, or every row when `None`.
    pub status_filter: Option<TaskStatus>,
    /// Ordering column.
    pub sort_field: SortField,
    /// Ordering direction.
    pub sort_order: SortOrder,
}

impl FilterState {
    /// Selects a sort column. Picking the current column flips the
    /// direction; picking a new one starts ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_order = self.sort_order.flipped();
        } else {
            self.sort_field = field;
            self.sort_order = SortOrder::Asc;
        }
    }

    /// Returns `true` if `task` passes the search text and status filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status_filter
            && task.status != status
        {
            return false;
        }
        let needle = self.search_text.to_lowercase();
        needle.is_empty()
            || task.title.to_lowercase().contains(&needle)
            || task.assignee.to_lowercase().contains(&needle)
            || task.status.as_str().to_lowercase().contains(&needle)
    }
}

/// Per-status counts over the whole collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Every record.
    pub total: usize,
    /// Records in `Todo`.
    pub todo: usize,
    /// Records in `Doing`.
    pub in_progress: usize,
    /// Records in `Done`.
    pub done: usize,
}

impl Summary {
    /// Counts records by status label, ignoring case.
    #[must_use]
    pub fn of(tasks: &[Task]) -> Self {
        let count = |label: &str| {
            tasks
                .iter()
                .filter(|t| t.status.as_str().eq_ignore_ascii_case(label))
                .count()
        };
        Self {
            total: tasks.len(),
            todo: count("todo"),
            in_progress: count("doing"),
            done: count("done"),
        }
    }
}

/// Why a view has no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The collection itself is empty.
    NoTasks,
    /// Every record was filtered out.
    NoMatches,
}

impl EmptyReason {
    /// Returns the text shown in place of the table.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NoTasks => "No tasks found.",
            Self::NoMatches => "No tasks match your filters.",
        }
    }
}

/// What the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedView {
    /// Filtered and sorted rows.
    pub rows: Vec<Task>,
    /// Counts over the whole collection.
    pub summary: Summary,
    /// Distinct statuses in first-seen order.
    pub statuses: Vec<TaskStatus>,
}

impl DerivedView {
    /// Returns why there are no rows, or `None` if there are some.
    #[must_use]
    pub fn empty_reason(&self) -> Option<EmptyReason> {
        if !self.rows.is_empty() {
            None
        } else if self.summary.total == 0 {
            Some(EmptyReason::NoTasks)
        } else {
            Some(EmptyReason::NoMatches)
        }
    }
}

/// Rank used for priority ordering: `High` 1, `Medium` 2, `Low` 3, and 99
/// for anything else. Case-insensitive.
#[must_use]
pub fn priority_rank(label: &str) -> u8 {
    match label.to_ascii_lowercase().as_str() {
        "high" => 1,
        "medium" => 2,
        "low" => 3,
        _ => 99,
    }
}

/// Distinct statuses in the order they first appear.
#[must_use]
pub fn unique_statuses(tasks: &[Task]) -> Vec<TaskStatus> {
    let mut seen = Vec::with_capacity(TaskStatus::ALL.len());
    for task in tasks {
        if !seen.contains(&task.status) {
            seen.push(task.status);
        }
    }
    seen
}

/// Orders due dates as calendar instants in `order`; unparseable dates go
/// last either way.
fn compare_due(a: &Task, b: &Task, order: SortOrder) -> Ordering {
    match (parse_due_date(&a.due_date), parse_due_date(&b.due_date)) {
        (Some(x), Some(y)) => match order {
            SortOrder::Asc => x.cmp(&y),
            SortOrder::Desc => y.cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_priority(a: &Task, b: &Task) -> Ordering {
    priority_rank(a.priority.as_str()).cmp(&priority_rank(b.priority.as_str()))
}

/// Projects `tasks` through `filter`.
#[must_use]
pub fn derive(tasks: &[Task], filter: &FilterState) -> DerivedView {
    let mut rows: Vec<Task> = tasks
        .iter()
        .filter(|t| filter.matches(t))
        .cloned()
        .collect();

    // `sort_by` is stable, so equal keys keep collection order in both
    // directions.
    let order = filter.sort_order;
    match (filter.sort_field, order) {
        (SortField::None, _) => {}
        (SortField::DueDate, _) => rows.sort_by(|a, b| compare_due(a, b, order)),
        (SortField::Priority, SortOrder::Asc) => rows.sort_by(compare_priority),
        (SortField::Priority, SortOrder::Desc) => rows.sort_by(|a, b| compare_priority(b, a)),
    }

    DerivedView {
        rows,
        summary: Summary::of(tasks),
        statuses: unique_statuses(tasks),
    }
}
