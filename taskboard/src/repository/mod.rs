//! Repository layer: CRUD access to the remote task store.
//!
//! Defines the [`TaskRepository`] trait the reconciliation engine talks to.
//! Concrete implementations:
//! - [`http::HttpRepository`]: REST client for a `Taskboard` backend
//! - [`memory::MemoryRepository`]: in-process store with failure injection,
//!   used by tests and the offline demo

pub mod http;
pub mod memory;

use std::future::Future;

use taskboard_proto::task::{NewTask, Task, TaskId, TaskPatch, User, ValidationError};

/// Errors a repository call can fail with.
///
/// A response that fails validation is reported as [`RepositoryError::Validation`];
/// callers that only care about success treat it the same as a network failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// Transport failure, timeout, or unexpected status.
    #[error("network error: {0}")]
    Network(String),

    /// Request or response did not match the task shape.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The targeted task does not exist remotely.
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

/// Async CRUD contract for the remote task store.
///
/// Every returned task has already passed boundary validation.
pub trait TaskRepository: Send + Sync {
    /// List every task in server order.
    fn list(&self) -> impl Future<Output = Result<Vec<Task>, RepositoryError>> + Send;

    /// Fetch a single task.
    fn get(&self, id: &TaskId) -> impl Future<Output = Result<Task, RepositoryError>> + Send;

    /// Create a task; the store assigns its id.
    fn create(&self, task: &NewTask)
    -> impl Future<Output = Result<Task, RepositoryError>> + Send;

    /// Merge a patch into an existing task and return the stored result.
    fn update(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> impl Future<Output = Result<Task, RepositoryError>> + Send;

    /// Delete a task.
    fn remove(&self, id: &TaskId) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// List users that can be assigned to tasks.
    fn list_users(&self) -> impl Future<Output = Result<Vec<User>, RepositoryError>> + Send;
}
