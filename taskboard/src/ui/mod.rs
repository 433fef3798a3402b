//! Terminal UI rendering.

pub mod detail;
pub mod status_bar;
pub mod task_table;
pub mod theme;

use std::fmt::Write as _;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use taskboard_proto::task::parse_due_date;

use crate::app::App;
use crate::repository::TaskRepository;

/// Main draw function for the entire UI.
pub fn draw<R: TaskRepository + 'static>(frame: &mut Frame, app: &App<R>) {
    let view = app.board.view();
    let cursor = app.cursor.min(view.rows.len().saturating_sub(1));

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Summary + filter
            Constraint::Min(3),    // Table (+ detail)
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    task_table::render_header(frame, main_chunks[0], app, &view);

    if app.show_detail || app.board.session().is_some() {
        let content = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[1]);
        task_table::render(frame, content[0], app, &view, cursor);
        detail::render(frame, content[1], app);
    } else {
        task_table::render(frame, main_chunks[1], app, &view, cursor);
    }

    status_bar::render(frame, main_chunks[2], app);
}

/// Formats a due date for display. Unparseable values and bad format
/// strings fall back to the raw text.
#[must_use]
pub fn format_due(raw: &str, format: &str) -> String {
    let Some(due) = parse_due_date(raw) else {
        return raw.to_string();
    };
    let mut out = String::new();
    if write!(out, "{}", due.format(format)).is_err() {
        return raw.to_string();
    }
    out
}
