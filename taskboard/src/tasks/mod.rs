//! Local task collection for `Taskboard`.
//!
//! [`TaskEngine`] keeps an ordered copy of the remote task list, applies
//! create/update/delete optimistically and reconciles each one with the
//! repository's answer. [`view`] projects that collection through the
//! current filter and sort settings.

pub mod engine;
pub mod view;

use std::fmt;

use taskboard_proto::task::TaskId;

use crate::repository::RepositoryError;

pub use engine::TaskEngine;
pub use view::{DerivedView, FilterState, SortField, SortOrder, Summary, derive};

/// The kind of mutation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationOp {
    /// Adding a new task.
    Create,
    /// Patching an existing task.
    Update,
    /// Removing a task.
    Delete,
}

impl fmt::Display for MutationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Whether the collection reflects the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A listing is in flight. Rows from the previous listing stay visible.
    Loading,
    /// The last listing succeeded.
    Ready,
    /// The last listing failed; the collection is empty until retried.
    Failed(RepositoryError),
}

/// Errors returned by [`TaskEngine`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The task is not in the local collection.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The repository rejected a mutation; local state was rolled back.
    #[error("{op} of task {id} failed: {source}")]
    MutationFailed {
        /// Which mutation failed.
        op: MutationOp,
        /// Local id the mutation targeted (a temporary id for creates).
        id: TaskId,
        /// Repository failure.
        #[source]
        source: RepositoryError,
    },

    /// Listing or fetching from the repository failed.
    #[error("failed to load tasks: {0}")]
    Load(#[source] RepositoryError),
}
