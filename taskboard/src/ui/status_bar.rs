//! Status bar rendering.

use std::time::Instant;

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, InputMode};
use crate::repository::TaskRepository;

/// Render the status bar at the bottom of the screen.
///
/// A visible notice takes the place of the key help.
pub fn render<R: TaskRepository + 'static>(frame: &mut Frame, area: Rect, app: &App<R>) {
    let mut spans = vec![Span::styled("Taskboard", theme::bold()), Span::raw(" | ")];

    if let Some(notice) = app.notices.visible(Instant::now()) {
        spans.push(Span::styled(notice.text.clone(), theme::notice(notice.kind)));
    } else {
        let help_text = match app.mode {
            InputMode::Browse if app.show_detail => {
                "↑↓/jk: select | e: edit | x: delete | Esc: close details"
            }
            InputMode::Browse => {
                "/: search | f: status | p/d: sort | Enter: details | e: edit | n: new | x: delete | r: reload | q: quit"
            }
            InputMode::Search => "Type to filter | Enter: done | Esc: clear",
            InputMode::Form(_) => "Tab: next field | Enter: save | Esc: cancel",
        };
        spans.push(Span::styled(help_text, theme::dimmed()));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
