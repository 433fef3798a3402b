//! Detail pane and the create/edit form.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::{format_due, theme};
use crate::app::{App, FormField, InputMode};
use crate::board::{EditSession, TaskForm};
use crate::repository::TaskRepository;

/// Render the form if one is open, otherwise the selected task.
pub fn render<R: TaskRepository + 'static>(frame: &mut Frame, area: Rect, app: &App<R>) {
    if let Some(session) = app.board.session() {
        let focus = match app.mode {
            InputMode::Form(field) => Some(field),
            _ => None,
        };
        render_form(frame, area, session, focus);
    } else {
        render_details(frame, area, app);
    }
}

fn render_details<R: TaskRepository + 'static>(frame: &mut Frame, area: Rect, app: &App<R>) {
    let block = Block::default()
        .title(Span::styled("Details", theme::panel_title(theme::DETAIL_TITLE)))
        .borders(Borders::ALL)
        .border_style(theme::normal());

    let Some(task) = app.board.selected_task() else {
        let hint = Paragraph::new(Span::styled("Select a task with ↑↓ and Enter.", theme::dimmed()))
            .block(block);
        frame.render_widget(hint, area);
        return;
    };

    let field = |label: &'static str, value: Span<'static>| {
        Line::from(vec![Span::styled(format!("{label:<10}"), theme::dimmed()), value])
    };

    let mut lines = vec![
        Line::from(Span::styled(task.title.clone(), theme::bold())),
        Line::default(),
        field(
            "Status",
            Span::styled(
                task.status.as_str(),
                theme::normal().fg(theme::status_color(task.status)),
            ),
        ),
        field("Assignee", Span::raw(task.assignee.clone())),
        field(
            "Priority",
            Span::styled(
                task.priority.as_str(),
                theme::normal().fg(theme::priority_color(task.priority)),
            ),
        ),
        field(
            "Due",
            Span::raw(format_due(&task.due_date, &app.date_format)),
        ),
        Line::default(),
    ];
    match task.description.as_deref() {
        Some(text) if !text.is_empty() => lines.push(Line::from(text.to_string())),
        _ => lines.push(Line::from(Span::styled("No description.", theme::dimmed()))),
    }
    if app.board.engine().is_provisional(&task.id) {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Saving...", theme::provisional())));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_form(frame: &mut Frame, area: Rect, session: &EditSession, focus: Option<FormField>) {
    let title = if session.target.is_some() {
        "Edit task"
    } else {
        "New task"
    };
    let block = Block::default()
        .title(Span::styled(title, theme::panel_title(theme::DETAIL_TITLE)))
        .borders(Borders::ALL)
        .border_style(theme::highlighted());

    let mut lines: Vec<Line> = FormField::ALL
        .iter()
        .map(|&field| {
            let focused = focus == Some(field);
            let label_style = if focused {
                theme::highlighted()
            } else {
                theme::dimmed()
            };
            let mut value = field_value(&session.form, field);
            if focused {
                value.push('_');
            }
            Line::from(vec![
                Span::styled(format!("{:<12}", field.label()), label_style),
                Span::styled(value, theme::normal()),
            ])
        })
        .collect();
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Tab: next field | ←→: cycle | Enter: save | Esc: cancel",
        theme::dimmed(),
    )));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn field_value(form: &TaskForm, field: FormField) -> String {
    match field {
        FormField::Title => form.title.clone(),
        FormField::Status => format!("< {} >", form.status),
        FormField::Assignee => form.assignee.clone(),
        FormField::Priority => format!("< {} >", form.priority),
        FormField::DueDate => form.due_date.clone(),
        FormField::Description => form.description.clone(),
    }
}
