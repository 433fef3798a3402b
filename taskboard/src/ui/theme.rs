//! Theme and styling constants for the TUI.

use ratatui::style::{Color, Modifier, Style};

use taskboard_proto::task::{Priority, TaskStatus};

use crate::notify::NoticeKind;

/// Primary foreground color.
pub const FG_PRIMARY: Color = Color::White;

/// Secondary foreground color (dimmed text).
pub const FG_SECONDARY: Color = Color::Gray;

/// Highlight color for focused elements.
pub const HIGHLIGHT: Color = Color::Cyan;

/// Success color.
pub const SUCCESS: Color = Color::Green;

/// Warning color.
pub const WARNING: Color = Color::Yellow;

/// Error color.
pub const ERROR: Color = Color::Red;

/// Panel title color for the task table.
pub const TASKS_TITLE: Color = Color::Green;

/// Panel title color for the detail pane.
pub const DETAIL_TITLE: Color = Color::Blue;

/// Normal text style.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Dimmed text style (labels, hints).
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

/// Bold text style.
#[must_use]
pub fn bold() -> Style {
    Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD)
}

/// Highlighted text style (focused borders and fields).
#[must_use]
pub fn highlighted() -> Style {
    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

/// Selected row style.
#[must_use]
pub fn selected() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Rows whose create has not been confirmed yet.
#[must_use]
pub fn provisional() -> Style {
    Style::default()
        .fg(FG_SECONDARY)
        .add_modifier(Modifier::ITALIC)
}

/// Style for the status bar background.
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 50))
}

/// Style for panel titles with a given color (bold).
#[must_use]
pub fn panel_title(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Badge color for a workflow status.
#[must_use]
pub const fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Todo => Color::Rgb(251, 188, 5),
        TaskStatus::Doing => Color::Rgb(66, 133, 244),
        TaskStatus::Done => Color::Rgb(52, 168, 83),
    }
}

/// Badge color for a priority.
#[must_use]
pub const fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => ERROR,
        Priority::Medium => WARNING,
        Priority::Low => SUCCESS,
    }
}

/// Style for a notice line.
#[must_use]
pub fn notice(kind: NoticeKind) -> Style {
    let color = match kind {
        NoticeKind::Success => SUCCESS,
        NoticeKind::Error => ERROR,
        NoticeKind::Warning => WARNING,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}
