//! Intent surface between the front-end and the task engine.
//!
//! A [`Board`] owns the user's view settings (search, status filter, sort),
//! the selected task and the open create/edit form. Intents that reach the
//! repository return a future: the optimistic part and any form validation
//! run when the intent is called, the future finishes the round trip,
//! posts a [`Notice`](crate::notify::Notice) and, if configured, re-reads
//! the listing.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use taskboard_proto::task::{NewTask, Priority, Task, TaskId, TaskPatch, TaskStatus, User};

use crate::notify::Notifier;
use crate::repository::TaskRepository;
use crate::tasks::{DerivedView, EngineError, FilterState, SortField, TaskEngine, derive};

/// Board behavior settings.
#[derive(Debug, Clone, Copy)]
pub struct BoardConfig {
    /// Re-read the listing after every mutation settles.
    pub refresh_on_settle: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            refresh_on_settle: true,
        }
    }
}

/// Reasons a create/edit form is rejected before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// Title left empty.
    #[error("Title is required")]
    TitleRequired,
    /// Assignee left empty.
    #[error("Assignee is required")]
    AssigneeRequired,
    /// Due date left empty.
    #[error("Due date is required")]
    DueDateRequired,
    /// Due date does not parse.
    #[error("Due date must look like YYYY-MM-DD")]
    DueDateInvalid,
}

/// Errors returned by board intents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The form failed validation.
    #[error(transparent)]
    Form(#[from] FormError),
    /// The engine rejected or rolled back the operation.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Field values of the create/edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    /// Title input.
    pub title: String,
    /// Status selector.
    pub status: TaskStatus,
    /// Assignee input.
    pub assignee: String,
    /// Priority selector.
    pub priority: Priority,
    /// Due date input, `YYYY-MM-DD`.
    pub due_date: String,
    /// Description input.
    pub description: String,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            status: TaskStatus::Todo,
            assignee: String::new(),
            priority: Priority::Medium,
            due_date: String::new(),
            description: String::new(),
        }
    }
}

impl TaskForm {
    /// Pre-fills the form from a record. Timestamps are cut to the date.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            status: task.status,
            assignee: task.assignee.clone(),
            priority: task.priority,
            due_date: task.due_date.chars().take(10).collect(),
            description: task.description.clone().unwrap_or_default(),
        }
    }

    /// Checks required fields in display order.
    ///
    /// # Errors
    ///
    /// Returns the first [`FormError`] found.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.title.trim().is_empty() {
            return Err(FormError::TitleRequired);
        }
        if self.assignee.trim().is_empty() {
            return Err(FormError::AssigneeRequired);
        }
        let due = self.due_date.trim();
        if due.is_empty() {
            return Err(FormError::DueDateRequired);
        }
        if taskboard_proto::task::parse_due_date(due).is_none() {
            return Err(FormError::DueDateInvalid);
        }
        Ok(())
    }

    /// Builds a create payload from the trimmed inputs.
    #[must_use]
    pub fn to_new_task(&self) -> NewTask {
        let description = self.description.trim();
        NewTask {
            title: self.title.trim().to_string(),
            status: self.status,
            assignee: self.assignee.trim().to_string(),
            priority: self.priority,
            due_date: self.due_date.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
        }
    }

    /// Builds a patch carrying every field. An empty description clears it.
    #[must_use]
    pub fn to_patch(&self) -> TaskPatch {
        TaskPatch {
            title: Some(self.title.trim().to_string()),
            status: Some(self.status),
            assignee: Some(self.assignee.trim().to_string()),
            priority: Some(self.priority),
            due_date: Some(self.due_date.trim().to_string()),
            description: Some(self.description.trim().to_string()),
        }
    }
}

/// An open form: editing `target`, or creating when `target` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    /// Task being edited.
    pub target: Option<TaskId>,
    /// Current field values.
    pub form: TaskForm,
}

/// Post-settlement work shared by every mutating intent.
struct Settler<R> {
    engine: TaskEngine<R>,
    notifier: Notifier,
    refresh_on_settle: bool,
}

impl<R: TaskRepository + 'static> Settler<R> {
    async fn finish<T: Send>(
        self,
        result: Result<T, EngineError>,
        success: &str,
        failure: &str,
    ) -> Result<T, BoardError> {
        let dispatched = matches!(result, Ok(_) | Err(EngineError::MutationFailed { .. }));
        match &result {
            Ok(_) => self.notifier.success(success),
            Err(e) => self.notifier.error(failure_text(failure, e)),
        }
        if dispatched && self.refresh_on_settle && self.engine.resync().await.is_err() {
            self.notifier.warning("Could not refresh tasks.");
        }
        result.map_err(BoardError::from)
    }
}

fn failure_text(prefix: &str, error: &EngineError) -> String {
    match error {
        EngineError::NotFound(_) => "Task no longer exists.".to_string(),
        EngineError::MutationFailed { source, .. } | EngineError::Load(source) => {
            format!("{prefix}: {source}")
        }
    }
}

/// The user's window onto the task collection.
pub struct Board<R> {
    engine: TaskEngine<R>,
    notifier: Notifier,
    config: BoardConfig,
    filter: FilterState,
    selected: Option<TaskId>,
    session: Option<EditSession>,
    users: Arc<Mutex<Vec<User>>>,
}

impl<R: TaskRepository + 'static> Board<R> {
    /// Creates a board around an engine.
    pub fn new(engine: TaskEngine<R>, notifier: Notifier, config: BoardConfig) -> Self {
        Self {
            engine,
            notifier,
            config,
            filter: FilterState::default(),
            selected: None,
            session: None,
            users: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the engine behind this board.
    pub const fn engine(&self) -> &TaskEngine<R> {
        &self.engine
    }

    fn settler(&self) -> Settler<R> {
        Settler {
            engine: self.engine.clone(),
            notifier: self.notifier.clone(),
            refresh_on_settle: self.config.refresh_on_settle,
        }
    }

    // --- Reads ---

    /// Computes the rows, summary and status list for the current filter.
    #[must_use]
    pub fn view(&self) -> DerivedView {
        derive(&self.engine.tasks(), &self.filter)
    }

    /// Returns the current filter and sort settings.
    pub const fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Returns the selected task, if it is still in the collection.
    #[must_use]
    pub fn selected_task(&self) -> Option<Task> {
        self.selected.as_ref().and_then(|id| self.engine.get(id))
    }

    /// Returns the open form, if any.
    pub const fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    /// Returns the open form for editing its fields.
    pub const fn session_mut(&mut self) -> Option<&mut EditSession> {
        self.session.as_mut()
    }

    /// Returns users known to the backend, for assignee suggestions.
    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.users.lock().clone()
    }

    // --- View intents ---

    /// Sets the search text.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.filter.search_text = text.into();
    }

    /// Sets or clears the status filter.
    pub const fn set_status_filter(&mut self, status: Option<TaskStatus>) {
        self.filter.status_filter = status;
    }

    /// Sorts by `field`, flipping direction if it is already the sort field.
    pub fn set_sort(&mut self, field: SortField) {
        self.filter.toggle_sort(field);
    }

    /// Selects a task. Returns `false` if it is not in the collection.
    pub fn select_task(&mut self, id: &TaskId) -> bool {
        if self.engine.contains(id) {
            self.selected = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // --- Form intents ---

    /// Opens the edit form for task `id` and selects it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if `id` is not in the collection.
    pub fn begin_edit(&mut self, id: &TaskId) -> Result<&EditSession, BoardError> {
        let task = self
            .engine
            .get(id)
            .ok_or_else(|| EngineError::NotFound(id.clone()))?;
        self.selected = Some(task.id.clone());
        Ok(self.session.insert(EditSession {
            target: Some(task.id.clone()),
            form: TaskForm::from_task(&task),
        }))
    }

    /// Opens an empty create form.
    pub fn begin_create(&mut self) -> &EditSession {
        self.session.insert(EditSession {
            target: None,
            form: TaskForm::default(),
        })
    }

    /// Closes the open form without saving.
    pub fn cancel_edit(&mut self) {
        self.session = None;
    }

    /// Saves `form` over task `id`.
    ///
    /// Validation runs now; a rejected form stays open and an error notice
    /// is posted. Otherwise an edit form open on `id` closes, the selection
    /// clears and the edit is applied optimistically before this returns.
    ///
    /// # Errors
    ///
    /// The future resolves to [`BoardError::Form`] for a rejected form, or
    /// [`BoardError::Engine`] if the task is unknown or the update failed.
    pub fn submit_edit(
        &mut self,
        id: &TaskId,
        form: TaskForm,
    ) -> impl Future<Output = Result<Task, BoardError>> + Send + use<R> {
        let mutation = self.check_form(&form).map(|()| {
            if self.session.as_ref().is_some_and(|s| s.target.as_ref() == Some(id)) {
                self.session = None;
            }
            self.selected = None;
            self.engine.update(id, form.to_patch())
        });
        let settler = self.settler();
        async move {
            match mutation {
                Ok(update) => {
                    let result = update.await;
                    settler
                        .finish(result, "Task saved!", "Could not save task")
                        .await
                }
                Err(e) => Err(e),
            }
        }
    }

    /// Creates a task from `form`.
    ///
    /// Validation runs now; a rejected form stays open and an error notice
    /// is posted. Otherwise any open create form closes and a provisional
    /// row appears before this returns.
    ///
    /// # Errors
    ///
    /// The future resolves to [`BoardError::Form`] for a rejected form or
    /// [`BoardError::Engine`] if the create failed.
    pub fn submit_create(
        &mut self,
        form: TaskForm,
    ) -> impl Future<Output = Result<Task, BoardError>> + Send + use<R> {
        let mutation = self.check_form(&form).map(|()| {
            if self.session.as_ref().is_some_and(|s| s.target.is_none()) {
                self.session = None;
            }
            self.engine.create(form.to_new_task())
        });
        let settler = self.settler();
        async move {
            match mutation {
                Ok(create) => {
                    let result = create.await;
                    settler
                        .finish(result, "Task saved!", "Could not save task")
                        .await
                }
                Err(e) => Err(e),
            }
        }
    }

    /// Deletes a task. The row disappears before this returns.
    ///
    /// # Errors
    ///
    /// The future resolves to [`BoardError::Engine`] if the task is unknown
    /// or the delete failed (the row is restored).
    pub fn delete_task(
        &mut self,
        id: &TaskId,
    ) -> impl Future<Output = Result<(), BoardError>> + Send + use<R> {
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        let remove = self.engine.remove(id);
        let settler = self.settler();
        async move {
            let result = remove.await;
            settler
                .finish(result, "Task deleted.", "Could not delete task")
                .await
        }
    }

    fn check_form(&self, form: &TaskForm) -> Result<(), BoardError> {
        form.validate().map_err(|e| {
            tracing::debug!(error = %e, "form rejected");
            self.notifier.error(e.to_string());
            BoardError::Form(e)
        })
    }

    // --- Loading ---

    /// Loads tasks and the user directory.
    ///
    /// A failed task listing posts "Could not load tasks."; a failed user
    /// listing only logs.
    ///
    /// # Errors
    ///
    /// The future resolves to [`BoardError::Engine`] if the task listing
    /// fails.
    pub fn load(&self) -> impl Future<Output = Result<usize, BoardError>> + Send + use<R> {
        let reload = self.reload();
        let engine = self.engine.clone();
        let users = Arc::clone(&self.users);
        async move {
            let count = reload.await?;
            match engine.repository().list_users().await {
                Ok(list) => *users.lock() = list,
                Err(e) => tracing::warn!(error = %e, "failed to load users"),
            }
            Ok(count)
        }
    }

    /// Re-reads the task listing.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn reload(&self) -> impl Future<Output = Result<usize, BoardError>> + Send + use<R> {
        let engine = self.engine.clone();
        let notifier = self.notifier.clone();
        async move {
            engine.refresh().await.map_err(|e| {
                notifier.error("Could not load tasks.");
                BoardError::Engine(e)
            })
        }
    }

    /// Re-fetches one task for the detail pane and selects it.
    ///
    /// # Errors
    ///
    /// The future resolves to [`BoardError::Engine`] if the fetch fails.
    pub fn open_task(
        &mut self,
        id: &TaskId,
    ) -> impl Future<Output = Result<Task, BoardError>> + Send + use<R> {
        self.select_task(id);
        let engine = self.engine.clone();
        let id = id.clone();
        async move { engine.fetch(&id).await.map_err(BoardError::from) }
    }
}
