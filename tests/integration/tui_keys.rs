//! Integration tests for the terminal front-end's key handling.
//!
//! Drives [`App`] with synthetic key events against the demo store and
//! checks the board state and notices that result.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use taskboard::app::{App, FormField, InputMode};
use taskboard::board::{Board, BoardConfig};
use taskboard::notify::{Notice, NoticeDurations, NoticeKind, Notifier};
use taskboard::repository::memory::MemoryRepository;
use taskboard::tasks::TaskEngine;
use taskboard_proto::task::TaskStatus;

async fn demo_app() -> (App<MemoryRepository>, mpsc::Receiver<Notice>) {
    let (notifier, rx) = Notifier::channel(16, NoticeDurations::default());
    let engine = TaskEngine::new(MemoryRepository::demo());
    let board = Board::new(engine, notifier, BoardConfig::default());
    let app = App::new(board, "%Y-%m-%d");
    app.start().await;
    (app, rx)
}

fn press(app: &mut App<MemoryRepository>, code: KeyCode) -> Option<taskboard::app::Job> {
    app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_text(app: &mut App<MemoryRepository>, text: &str) {
    for c in text.chars() {
        assert!(press(app, KeyCode::Char(c)).is_none());
    }
}

fn titles(app: &App<MemoryRepository>) -> Vec<String> {
    app.board.view().rows.iter().map(|t| t.title.clone()).collect()
}

#[tokio::test]
async fn test_search_filters_rows() {
    let (mut app, _rx) = demo_app().await;

    press(&mut app, KeyCode::Char('/'));
    assert_eq!(app.mode, InputMode::Search);
    type_text(&mut app, "ben");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.mode, InputMode::Browse);
    assert_eq!(titles(&app), ["Write API docs", "Upgrade CI runners"]);
}

#[tokio::test]
async fn test_escape_in_search_clears_text() {
    let (mut app, _rx) = demo_app().await;

    press(&mut app, KeyCode::Char('/'));
    type_text(&mut app, "zzz");
    assert!(app.board.view().rows.is_empty());
    press(&mut app, KeyCode::Esc);

    assert!(app.board.filter().search_text.is_empty());
    assert_eq!(app.board.view().rows.len(), 5);
    assert!(!app.should_quit);
}

#[tokio::test]
async fn test_status_filter_cycles_back_to_all() {
    let (mut app, _rx) = demo_app().await;

    let mut seen = Vec::new();
    for _ in 0..4 {
        press(&mut app, KeyCode::Char('f'));
        seen.push((app.board.filter().status_filter, app.board.view().rows.len()));
    }

    assert_eq!(
        seen,
        [
            (Some(TaskStatus::Todo), 2),
            (Some(TaskStatus::Doing), 2),
            (Some(TaskStatus::Done), 1),
            (None, 5),
        ]
    );
}

#[tokio::test]
async fn test_priority_sort_toggles() {
    let (mut app, _rx) = demo_app().await;

    press(&mut app, KeyCode::Char('p'));
    assert_eq!(titles(&app)[..2], ["Fix login bug", "Upgrade CI runners"]);

    press(&mut app, KeyCode::Char('p'));
    assert_eq!(titles(&app)[0], "Write API docs");
}

#[tokio::test]
async fn test_cursor_moves_selection() {
    let (mut app, _rx) = demo_app().await;

    press(&mut app, KeyCode::Char('j'));
    press(&mut app, KeyCode::Down);
    assert_eq!(app.cursor, 2);
    assert_eq!(app.board.selected_task().unwrap().title, "Review pull requests");

    press(&mut app, KeyCode::Char('k'));
    assert_eq!(app.board.selected_task().unwrap().title, "Write API docs");

    for _ in 0..10 {
        press(&mut app, KeyCode::Down);
    }
    assert_eq!(app.cursor, 4);
}

#[tokio::test]
async fn test_new_task_form_submits() {
    let (mut app, mut rx) = demo_app().await;

    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.mode, InputMode::Form(FormField::Title));
    type_text(&mut app, "Deploy");
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    assert_eq!(app.mode, InputMode::Form(FormField::DueDate));
    type_text(&mut app, "2025-12-01");

    let job = press(&mut app, KeyCode::Enter).unwrap();
    assert_eq!(app.mode, InputMode::Browse);
    assert!(app.board.session().is_none());

    // The row is there before the request settles.
    let pending = app.board.view().rows.last().cloned().unwrap();
    assert_eq!(pending.title, "Deploy");
    assert_eq!(pending.status, TaskStatus::Doing);
    assert_eq!(pending.assignee, "Ana");
    assert!(app.board.engine().is_provisional(&pending.id));

    job.await;
    let notice = rx.recv().await.unwrap();
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.text, "Task saved!");
    assert_eq!(app.board.view().rows.len(), 6);
    assert!(!app.board.engine().is_provisional(&app.board.view().rows[5].id));
}

#[tokio::test]
async fn test_rejected_form_stays_open() {
    let (mut app, mut rx) = demo_app().await;

    press(&mut app, KeyCode::Char('n'));
    let job = press(&mut app, KeyCode::Enter).unwrap();
    job.await;

    assert!(matches!(app.mode, InputMode::Form(_)));
    assert!(app.board.session().is_some());
    let notice = rx.recv().await.unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.text, "Title is required");
    assert_eq!(app.board.view().rows.len(), 5);

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.mode, InputMode::Browse);
    assert!(app.board.session().is_none());
}

#[tokio::test]
async fn test_edit_highlighted_task() {
    let (mut app, mut rx) = demo_app().await;

    press(&mut app, KeyCode::Char('e'));
    assert_eq!(app.mode, InputMode::Form(FormField::Title));
    assert_eq!(app.board.session().unwrap().form.title, "Fix login bug");
    type_text(&mut app, "!");

    let job = press(&mut app, KeyCode::Enter).unwrap();
    assert_eq!(titles(&app)[0], "Fix login bug!");

    job.await;
    assert_eq!(rx.recv().await.unwrap().text, "Task saved!");
    assert_eq!(titles(&app)[0], "Fix login bug!");
}

#[tokio::test]
async fn test_delete_highlighted_task() {
    let (mut app, mut rx) = demo_app().await;

    let job = press(&mut app, KeyCode::Char('x')).unwrap();
    assert_eq!(app.board.view().rows.len(), 4);
    assert!(!titles(&app).contains(&"Fix login bug".to_string()));

    job.await;
    assert_eq!(rx.recv().await.unwrap().text, "Task deleted.");
    assert_eq!(app.board.view().rows.len(), 4);
}

#[tokio::test]
async fn test_escape_closes_details_before_quitting() {
    let (mut app, _rx) = demo_app().await;

    let job = press(&mut app, KeyCode::Enter).unwrap();
    job.await;
    assert!(app.show_detail);
    assert_eq!(app.board.selected_task().unwrap().title, "Fix login bug");

    press(&mut app, KeyCode::Esc);
    assert!(!app.show_detail);
    assert!(!app.should_quit);

    press(&mut app, KeyCode::Char('q'));
    assert!(app.should_quit);
}

#[tokio::test]
async fn test_ctrl_c_quits_from_any_mode() {
    let (mut app, _rx) = demo_app().await;

    press(&mut app, KeyCode::Char('n'));
    app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
}

#[tokio::test]
async fn test_reload_returns_job() {
    let (mut app, _rx) = demo_app().await;

    let job = press(&mut app, KeyCode::Char('r')).unwrap();
    job.await;
    assert_eq!(app.board.view().rows.len(), 5);
}
