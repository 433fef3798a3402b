//! In-process repository for tests and offline demos.
//!
//! [`MemoryRepository`] behaves like the REST backend: it assigns ids,
//! validates inputs and reports unknown ids as [`RepositoryError::NotFound`].
//! On top of that it can be told to fail specific calls and can hold every
//! call at a gate, so callers can observe what happens while a request is
//! in flight.
//!
//! Clones share the same store, so a test can keep one handle for
//! inspection and failure injection while another is owned by the engine.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use taskboard_proto::task::{NewTask, Priority, Task, TaskId, TaskPatch, TaskStatus, User};
use tokio::sync::watch;

use super::{RepositoryError, TaskRepository};

/// Repository call kinds, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list`
    List,
    /// `get`
    Get,
    /// `create`
    Create,
    /// `update`
    Update,
    /// `remove`
    Remove,
    /// `list_users`
    ListUsers,
}

impl Operation {
    const COUNT: usize = 6;

    const fn index(self) -> usize {
        match self {
            Self::List => 0,
            Self::Get => 1,
            Self::Create => 2,
            Self::Update => 3,
            Self::Remove => 4,
            Self::ListUsers => 5,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::ListUsers => "list_users",
        };
        f.write_str(name)
    }
}

struct State {
    tasks: Vec<Task>,
    users: Vec<User>,
    next_id: u64,
    /// One-shot failures, consumed front to back per operation.
    failures: VecDeque<(Operation, RepositoryError)>,
    /// Failure returned by every call while set.
    fail_all: Option<RepositoryError>,
    calls: [usize; Operation::COUNT],
}

struct Shared {
    state: Mutex<State>,
    /// `true` while calls may proceed.
    gate: watch::Sender<bool>,
}

/// In-memory [`TaskRepository`] with failure injection.
#[derive(Clone)]
pub struct MemoryRepository {
    shared: Arc<Shared>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("MemoryRepository")
            .field("tasks", &state.tasks.len())
            .field("pending_failures", &state.failures.len())
            .field("fail_all", &state.fail_all.is_some())
            .finish_non_exhaustive()
    }
}

impl MemoryRepository {
    /// Creates an empty repository. Ids are minted as `"1"`, `"2"`, ...
    #[must_use]
    pub fn new() -> Self {
        Self::with_tasks(Vec::new())
    }

    /// Creates a repository holding `tasks` in the given order.
    ///
    /// Freshly minted ids continue after the largest numeric id present.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks
            .iter()
            .filter_map(|t| t.id.as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let (gate, _) = watch::channel(true);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    tasks,
                    users: Vec::new(),
                    next_id,
                    failures: VecDeque::new(),
                    fail_all: None,
                    calls: [0; Operation::COUNT],
                }),
                gate,
            }),
        }
    }

    /// Creates a repository pre-filled with demo tasks and users.
    #[must_use]
    pub fn demo() -> Self {
        let repo = Self::new();
        for new in demo_tasks() {
            repo.seed(new);
        }
        repo.shared.state.lock().users = ["Ana", "Ben", "Chioma", "Dmitri"]
            .iter()
            .enumerate()
            .map(|(i, name)| User {
                id: format!("u{}", i + 1),
                name: (*name).to_string(),
            })
            .collect();
        repo
    }

    /// Inserts a task directly, bypassing failure injection and the gate.
    pub fn seed(&self, new: NewTask) -> Task {
        let mut state = self.shared.state.lock();
        let task = Task::from_new(mint_id(&mut state), new);
        state.tasks.push(task.clone());
        task
    }

    /// Replaces or appends a record as if another client had written it.
    pub fn put(&self, task: Task) {
        let mut state = self.shared.state.lock();
        if let Some(slot) = state.tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        } else {
            state.tasks.push(task);
        }
    }

    /// Returns the stored tasks in listing order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.shared.state.lock().tasks.clone()
    }

    /// Makes the next call of `op` fail with `error`.
    ///
    /// Calling this repeatedly queues one failure per call.
    pub fn fail_next(&self, op: Operation, error: RepositoryError) {
        self.shared.state.lock().failures.push_back((op, error));
    }

    /// Makes every call fail with `error` until cleared with `None`.
    pub fn fail_all(&self, error: Option<RepositoryError>) {
        self.shared.state.lock().fail_all = error;
    }

    /// Returns how many calls of `op` have reached the store.
    #[must_use]
    pub fn calls(&self, op: Operation) -> usize {
        self.shared.state.lock().calls[op.index()]
    }

    /// Holds every subsequent call until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.shared.gate.send_replace(false);
    }

    /// Releases held calls.
    pub fn resume(&self) {
        self.shared.gate.send_replace(true);
    }

    /// Waits at the gate, then runs `f` against the state unless a failure
    /// is injected for `op`.
    async fn call<T>(
        &self,
        op: Operation,
        f: impl FnOnce(&mut State) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut gate = self.shared.gate.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = gate.wait_for(|open| *open).await;

        let mut state = self.shared.state.lock();
        state.calls[op.index()] += 1;
        if let Some(error) = &state.fail_all {
            tracing::debug!(%op, %error, "memory repository failing all calls");
            return Err(error.clone());
        }
        if let Some(pos) = state.failures.iter().position(|(o, _)| *o == op)
            && let Some((_, error)) = state.failures.remove(pos)
        {
            tracing::debug!(%op, %error, "injected failure");
            return Err(error);
        }
        f(&mut state)
    }
}

fn mint_id(state: &mut State) -> TaskId {
    loop {
        let id = TaskId::new(state.next_id.to_string());
        state.next_id += 1;
        if !state.tasks.iter().any(|t| t.id == id) {
            return id;
        }
    }
}

fn find_mut<'a>(state: &'a mut State, id: &TaskId) -> Result<&'a mut Task, RepositoryError> {
    state
        .tasks
        .iter_mut()
        .find(|t| t.id == *id)
        .ok_or_else(|| RepositoryError::NotFound(id.clone()))
}

impl TaskRepository for MemoryRepository {
    async fn list(&self) -> Result<Vec<Task>, RepositoryError> {
        self.call(Operation::List, |state| Ok(state.tasks.clone()))
            .await
    }

    async fn get(&self, id: &TaskId) -> Result<Task, RepositoryError> {
        self.call(Operation::Get, |state| find_mut(state, id).map(|t| t.clone()))
            .await
    }

    async fn create(&self, task: &NewTask) -> Result<Task, RepositoryError> {
        self.call(Operation::Create, |state| {
            task.validate()?;
            let created = Task::from_new(mint_id(state), task.clone());
            state.tasks.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RepositoryError> {
        self.call(Operation::Update, |state| {
            patch.validate()?;
            let stored = find_mut(state, id)?;
            let mut merged = stored.clone();
            merged.apply_patch(patch);
            merged.validate()?;
            *stored = merged.clone();
            Ok(merged)
        })
        .await
    }

    async fn remove(&self, id: &TaskId) -> Result<(), RepositoryError> {
        self.call(Operation::Remove, |state| {
            let index = state
                .tasks
                .iter()
                .position(|t| t.id == *id)
                .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
            state.tasks.remove(index);
            Ok(())
        })
        .await
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        self.call(Operation::ListUsers, |state| Ok(state.users.clone()))
            .await
    }
}

fn demo_tasks() -> Vec<NewTask> {
    let task = |title: &str, status, assignee: &str, priority, due: &str, notes: Option<&str>| {
        NewTask {
            title: title.to_string(),
            status,
            assignee: assignee.to_string(),
            priority,
            due_date: due.to_string(),
            description: notes.map(str::to_string),
        }
    };
    vec![
        task(
            "Fix login bug",
            TaskStatus::Todo,
            "Ana",
            Priority::High,
            "2025-11-12",
            Some("Session cookie is dropped after the OAuth redirect."),
        ),
        task("Write API docs", TaskStatus::Done, "Ben", Priority::Low, "2025-10-01", None),
        task(
            "Review pull requests",
            TaskStatus::Doing,
            "Chioma",
            Priority::Medium,
            "2025-11-03",
            None,
        ),
        task("Plan sprint", TaskStatus::Todo, "Dmitri", Priority::Medium, "2025-11-20", None),
        task(
            "Upgrade CI runners",
            TaskStatus::Doing,
            "Ben",
            Priority::High,
            "2025-11-05",
            Some("Move to the larger instance type."),
        ),
    ]
}
