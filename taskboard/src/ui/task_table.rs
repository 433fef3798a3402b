//! Summary line, filter line and the task table.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use taskboard_proto::task::TaskStatus;

use super::{format_due, theme};
use crate::app::{App, InputMode};
use crate::repository::TaskRepository;
use crate::tasks::{DerivedView, LoadState, SortField, SortOrder};

/// Render the summary counts and the active filter above the table.
pub fn render_header<R: TaskRepository + 'static>(
    frame: &mut Frame,
    area: Rect,
    app: &App<R>,
    view: &DerivedView,
) {
    let summary = &view.summary;
    let counts = Line::from(vec![
        Span::styled(format!("Total {}", summary.total), theme::bold()),
        Span::raw("  "),
        Span::styled(
            format!("To do {}", summary.todo),
            theme::normal().fg(theme::status_color(TaskStatus::Todo)),
        ),
        Span::raw("  "),
        Span::styled(
            format!("In progress {}", summary.in_progress),
            theme::normal().fg(theme::status_color(TaskStatus::Doing)),
        ),
        Span::raw("  "),
        Span::styled(
            format!("Done {}", summary.done),
            theme::normal().fg(theme::status_color(TaskStatus::Done)),
        ),
    ]);

    let filter = app.board.filter();
    let searching = app.mode == InputMode::Search;
    let search = if searching {
        format!("{}_", filter.search_text)
    } else if filter.search_text.is_empty() {
        "-".to_string()
    } else {
        filter.search_text.clone()
    };
    let status = filter
        .status_filter
        .map_or_else(|| "all".to_string(), |s| s.to_string());
    let sort = match filter.sort_field {
        SortField::None => "none".to_string(),
        field => {
            let arrow = if filter.sort_order == SortOrder::Asc { "↑" } else { "↓" };
            let name = if field == SortField::Priority { "priority" } else { "due date" };
            format!("{name} {arrow}")
        }
    };
    let filters = Line::from(vec![
        Span::styled("Search: ", theme::dimmed()),
        Span::styled(
            search,
            if searching { theme::highlighted() } else { theme::normal() },
        ),
        Span::styled("  Status: ", theme::dimmed()),
        Span::raw(status),
        Span::styled("  Sort: ", theme::dimmed()),
        Span::raw(sort),
    ]);

    frame.render_widget(Paragraph::new(vec![counts, filters]), area);
}

/// Render the task table, or the reason it is empty.
pub fn render<R: TaskRepository + 'static>(
    frame: &mut Frame,
    area: Rect,
    app: &App<R>,
    view: &DerivedView,
    cursor: usize,
) {
    let focused = matches!(app.mode, InputMode::Browse | InputMode::Search);
    let block = Block::default()
        .title(Span::styled("Tasks", theme::panel_title(theme::TASKS_TITLE)))
        .borders(Borders::ALL)
        .border_style(if focused { theme::highlighted() } else { theme::normal() });

    if view.rows.is_empty() {
        let message = match app.board.engine().load_state() {
            LoadState::Loading => "Loading tasks...",
            LoadState::Failed(_) => "Could not load tasks. Press r to retry.",
            LoadState::Idle | LoadState::Ready => view
                .empty_reason()
                .map_or("", |reason| reason.message()),
        };
        let paragraph = Paragraph::new(Span::styled(message, theme::dimmed()))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(["Title", "Status", "Assignee", "Priority", "Due"])
        .style(theme::bold());

    let rows: Vec<Row> = view
        .rows
        .iter()
        .map(|task| {
            let title_style = if app.board.engine().is_provisional(&task.id) {
                theme::provisional()
            } else {
                theme::normal()
            };
            Row::new(vec![
                Cell::from(Span::styled(task.title.clone(), title_style)),
                Cell::from(Span::styled(
                    task.status.as_str(),
                    theme::normal().fg(theme::status_color(task.status)),
                )),
                Cell::from(task.assignee.clone()),
                Cell::from(Span::styled(
                    task.priority.as_str(),
                    theme::normal().fg(theme::priority_color(task.priority)),
                )),
                Cell::from(format_due(&task.due_date, &app.date_format)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(7),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(12),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(theme::selected());

    let mut state = TableState::default().with_selected(Some(cursor));
    frame.render_stateful_widget(table, area, &mut state);
}
