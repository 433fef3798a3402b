//! In-memory task table backing the reference REST server.
//!
//! The [`TaskStore`] keeps tasks in insertion order, which is the order
//! `GET /tasks` lists them in. Ids are UUID v7 strings minted on create.

use taskboard_proto::task::{NewTask, Task, TaskId, TaskPatch, User};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory task table plus a static user directory.
///
/// Thread-safe via [`RwLock`]. Every write holds the lock for the whole
/// operation so listings never observe a half-applied change.
pub struct TaskStore {
    tasks: RwLock<Vec<Task>>,
    users: Vec<User>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Creates an empty store with no users.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(Vec::new()),
            users: Vec::new(),
        }
    }

    /// Creates a store pre-filled with demo tasks and users.
    #[must_use]
    pub fn seeded() -> Self {
        let tasks = seed_tasks()
            .into_iter()
            .map(|new| Task::from_new(next_id(), new))
            .collect();
        let users = ["Ana", "Ben", "Chioma", "Dmitri"]
            .iter()
            .enumerate()
            .map(|(i, name)| User {
                id: format!("u{}", i + 1),
                name: (*name).to_string(),
            })
            .collect();
        Self {
            tasks: RwLock::new(tasks),
            users,
        }
    }

    /// Returns every task in insertion order.
    pub async fn list(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    /// Returns a single task, if it exists.
    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.read().await.iter().find(|t| t.id == *id).cloned()
    }

    /// Inserts a new task with a freshly minted id and returns it.
    pub async fn create(&self, new: NewTask) -> Task {
        let task = Task::from_new(next_id(), new);
        self.tasks.write().await.push(task.clone());
        task
    }

    /// Merges a patch into an existing task and returns the result.
    ///
    /// Returns `None` if the task does not exist.
    pub async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.iter_mut().find(|t| t.id == *id)?;
        task.apply_patch(patch);
        Some(task.clone())
    }

    /// Deletes a task, returning the removed record.
    pub async fn remove(&self, id: &TaskId) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let index = tasks.iter().position(|t| t.id == *id)?;
        Some(tasks.remove(index))
    }

    /// Returns the user directory.
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Returns the number of stored tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Returns `true` if no tasks are stored.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

fn next_id() -> TaskId {
    TaskId::new(Uuid::now_v7().to_string())
}

fn seed_tasks() -> Vec<NewTask> {
    use taskboard_proto::task::{Priority, TaskStatus};

    let task = |title: &str, status, assignee: &str, priority, due: &str| NewTask {
        title: title.to_string(),
        status,
        assignee: assignee.to_string(),
        priority,
        due_date: due.to_string(),
        description: None,
    };
    vec![
        task("Fix login bug", TaskStatus::Todo, "Ana", Priority::High, "2025-11-12"),
        task("Write API docs", TaskStatus::Done, "Ben", Priority::Low, "2025-10-01"),
        task("Review pull requests", TaskStatus::Doing, "Chioma", Priority::Medium, "2025-11-03"),
        task("Plan sprint", TaskStatus::Todo, "Dmitri", Priority::Medium, "2025-11-20"),
    ]
}
