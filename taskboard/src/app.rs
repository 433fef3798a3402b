//! Application state and key handling for the TUI.
//!
//! [`App`] owns the [`Board`] and the bits of state that only matter on
//! screen: the table cursor, the input mode and the visible notice. Key
//! handling is synchronous; anything that talks to the backend comes back
//! as a [`Job`] for the event loop to spawn.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use taskboard_proto::task::{TaskStatus, User};

use crate::board::{Board, TaskForm};
use crate::notify::{Notice, NoticeBoard};
use crate::repository::TaskRepository;
use crate::tasks::SortField;

/// Backend work produced by a key press.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Which form field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    /// Task title.
    #[default]
    Title,
    /// Workflow status (cycled, not typed).
    Status,
    /// Assignee name.
    Assignee,
    /// Priority (cycled, not typed).
    Priority,
    /// Due date.
    DueDate,
    /// Free-form description.
    Description,
}

impl FormField {
    /// Fields in tab order.
    pub const ALL: [Self; 6] = [
        Self::Title,
        Self::Status,
        Self::Assignee,
        Self::Priority,
        Self::DueDate,
        Self::Description,
    ];

    /// Label shown beside the field.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Status => "Status",
            Self::Assignee => "Assignee",
            Self::Priority => "Priority",
            Self::DueDate => "Due date",
            Self::Description => "Description",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Title => 0,
            Self::Status => 1,
            Self::Assignee => 2,
            Self::Priority => 3,
            Self::DueDate => 4,
            Self::Description => 5,
        }
    }

    const fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    const fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// What keys currently do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Navigating the table.
    #[default]
    Browse,
    /// Typing into the search box.
    Search,
    /// Filling in the create/edit form.
    Form(FormField),
}

/// Screen state wrapped around a [`Board`].
pub struct App<R> {
    /// The board the screen renders.
    pub board: Board<R>,
    /// Index of the highlighted row in the current view.
    pub cursor: usize,
    /// Current input mode.
    pub mode: InputMode,
    /// Whether the detail pane is open.
    pub show_detail: bool,
    /// Chrono format for due dates.
    pub date_format: String,
    /// Latest notice.
    pub notices: NoticeBoard,
    /// Set when the user asks to quit.
    pub should_quit: bool,
}

impl<R: TaskRepository + 'static> App<R> {
    /// Creates the screen state.
    pub fn new(board: Board<R>, date_format: impl Into<String>) -> Self {
        Self {
            board,
            cursor: 0,
            mode: InputMode::Browse,
            show_detail: false,
            date_format: date_format.into(),
            notices: NoticeBoard::default(),
            should_quit: false,
        }
    }

    /// Shows a notice drained from the board's channel.
    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.show(notice, Instant::now());
    }

    /// Kicks off the initial load.
    pub fn start(&self) -> Job {
        let load = self.board.load();
        Box::pin(async move {
            if let Err(e) = load.await {
                tracing::warn!(error = %e, "initial load failed");
            }
        })
    }

    /// Handles one key press. Returns backend work to spawn, if any.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<Job> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        match self.mode {
            InputMode::Browse => self.handle_browse_key(key),
            InputMode::Search => {
                self.handle_search_key(key);
                None
            }
            InputMode::Form(field) => self.handle_form_key(field, key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Option<Job> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                if self.show_detail {
                    self.show_detail = false;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('/') => self.mode = InputMode::Search,
            KeyCode::Char('f') => self.cycle_status_filter(),
            KeyCode::Char('p') => self.sort_by(SortField::Priority),
            KeyCode::Char('d') => self.sort_by(SortField::DueDate),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Enter => return self.open_highlighted(),
            KeyCode::Char('e') => {
                let id = self.board.view().rows.get(self.cursor).map(|t| t.id.clone());
                if let Some(id) = id
                    && self.board.begin_edit(&id).is_ok()
                {
                    self.mode = InputMode::Form(FormField::Title);
                }
            }
            KeyCode::Char('n') => {
                self.board.begin_create();
                self.mode = InputMode::Form(FormField::Title);
            }
            KeyCode::Char('x') => return self.delete_highlighted(),
            KeyCode::Char('r') => {
                let reload = self.board.reload();
                return Some(Box::pin(async move {
                    if let Err(e) = reload.await {
                        tracing::debug!(error = %e, "reload failed");
                    }
                }));
            }
            _ => {}
        }
        None
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let mut text = self.board.filter().search_text.clone();
        match key.code {
            KeyCode::Enter => self.mode = InputMode::Browse,
            KeyCode::Esc => {
                text.clear();
                self.mode = InputMode::Browse;
            }
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Char(c) => text.push(c),
            _ => return,
        }
        self.board.set_search(text);
        self.cursor = 0;
    }

    fn handle_form_key(&mut self, field: FormField, key: KeyEvent) -> Option<Job> {
        match key.code {
            KeyCode::Esc => {
                self.board.cancel_edit();
                self.mode = InputMode::Browse;
            }
            KeyCode::Tab | KeyCode::Down => self.mode = InputMode::Form(field.next()),
            KeyCode::BackTab | KeyCode::Up => self.mode = InputMode::Form(field.prev()),
            KeyCode::Enter => return self.submit_form(),
            code => {
                let users = self.board.users();
                if let Some(session) = self.board.session_mut() {
                    edit_field(&mut session.form, field, code, &users);
                }
            }
        }
        None
    }

    fn submit_form(&mut self) -> Option<Job> {
        let session = self.board.session()?;
        let form = session.form.clone();
        let job: Job = if let Some(id) = session.target.clone() {
            let save = self.board.submit_edit(&id, form);
            Box::pin(async move {
                if let Err(e) = save.await {
                    tracing::debug!(error = %e, "edit not saved");
                }
            })
        } else {
            let save = self.board.submit_create(form);
            Box::pin(async move {
                if let Err(e) = save.await {
                    tracing::debug!(error = %e, "create not saved");
                }
            })
        };
        // A rejected form keeps its session open.
        if self.board.session().is_none() {
            self.mode = InputMode::Browse;
            self.show_detail = false;
        }
        Some(job)
    }

    fn cycle_status_filter(&mut self) {
        let next = match self.board.filter().status_filter {
            None => Some(TaskStatus::Todo),
            Some(TaskStatus::Done) => None,
            Some(status) => Some(status.next()),
        };
        self.board.set_status_filter(next);
        self.cursor = 0;
    }

    fn sort_by(&mut self, field: SortField) {
        self.board.set_sort(field);
        self.cursor = 0;
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.board.view().rows.len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
        self.select_highlighted();
    }

    fn select_highlighted(&mut self) -> bool {
        let rows = self.board.view().rows;
        match rows.get(self.cursor) {
            Some(task) => self.board.select_task(&task.id),
            None => false,
        }
    }

    fn open_highlighted(&mut self) -> Option<Job> {
        let task = self.board.view().rows.get(self.cursor).cloned()?;
        self.show_detail = true;
        let open = self.board.open_task(&task.id);
        Some(Box::pin(async move {
            if let Err(e) = open.await {
                tracing::debug!(error = %e, "could not refresh task details");
            }
        }))
    }

    fn delete_highlighted(&mut self) -> Option<Job> {
        let task = self.board.view().rows.get(self.cursor).cloned()?;
        self.show_detail = false;
        let delete = self.board.delete_task(&task.id);
        Some(Box::pin(async move {
            if let Err(e) = delete.await {
                tracing::debug!(error = %e, "delete not applied");
            }
        }))
    }
}

/// Applies one key to a form field. Status and priority cycle, the
/// assignee cycles through known users on Left/Right, everything else is
/// plain text editing.
fn edit_field(
    form: &mut TaskForm,
    field: FormField,
    code: KeyCode,
    users: &[User],
) {
    match field {
        FormField::Status => {
            if matches!(code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) {
                form.status = form.status.next();
            }
        }
        FormField::Priority => {
            if matches!(code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) {
                form.priority = form.priority.next();
            }
        }
        FormField::Assignee if matches!(code, KeyCode::Left | KeyCode::Right) => {
            if users.is_empty() {
                return;
            }
            let current = users.iter().position(|u| u.name == form.assignee);
            let next = match (current, code) {
                (None, KeyCode::Left) | (Some(0), KeyCode::Left) => users.len() - 1,
                (Some(i), KeyCode::Left) => i - 1,
                (Some(i), _) => (i + 1) % users.len(),
                (None, _) => 0,
            };
            form.assignee.clone_from(&users[next].name);
        }
        FormField::Title | FormField::Assignee | FormField::DueDate | FormField::Description => {
            let text = match field {
                FormField::Title => &mut form.title,
                FormField::Assignee => &mut form.assignee,
                FormField::DueDate => &mut form.due_date,
                _ => &mut form.description,
            };
            match code {
                KeyCode::Char(c) => text.push(c),
                KeyCode::Backspace => {
                    text.pop();
                }
                _ => {}
            }
        }
    }
}
