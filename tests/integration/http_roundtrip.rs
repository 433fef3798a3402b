//! End-to-end tests: engine and board against the reference server over HTTP.
//!
//! # Verification Focus
//!
//! - A create yields exactly one record, carrying the server-assigned id
//! - HTTP 404 surfaces as `NotFound`
//! - Updates and deletes reach the server and survive a refresh
//! - An unreachable backend rolls the optimistic change back

use std::sync::Arc;
use std::time::Duration;

use taskboard::board::{Board, BoardConfig, TaskForm};
use taskboard::notify::{NoticeDurations, NoticeKind, Notifier};
use taskboard::repository::http::{HttpConfig, HttpRepository};
use taskboard::repository::{RepositoryError, TaskRepository};
use taskboard::tasks::{EngineError, TaskEngine};
use taskboard_proto::task::{NewTask, Priority, TaskId, TaskPatch, TaskStatus};
use taskboard_server::api::{ApiState, start_server_with_state};
use taskboard_server::store::TaskStore;

async fn start(store: TaskStore) -> (Arc<ApiState>, HttpRepository) {
    let state = Arc::new(ApiState::with_store(store));
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .unwrap();
    let repo = HttpRepository::new(&HttpConfig {
        base_url: format!("http://{addr}"),
        request_timeout: Duration::from_secs(5),
    })
    .unwrap();
    (state, repo)
}

fn new_task(title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        status: TaskStatus::Todo,
        assignee: "Ben".to_string(),
        priority: Priority::High,
        due_date: "2025-05-01".to_string(),
        description: Some("from the test".to_string()),
    }
}

#[tokio::test]
async fn test_create_yields_one_record_with_server_id() {
    let (state, repo) = start(TaskStore::new()).await;
    let engine = TaskEngine::new(repo);
    engine.refresh().await.unwrap();

    let created = engine.create(new_task("Plan sprint")).await.unwrap();

    assert!(!created.id.as_str().starts_with("tmp-"));
    let tasks = engine.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, created.id);

    // A refresh racing in afterwards must not duplicate it.
    engine.refresh().await.unwrap();
    assert_eq!(engine.tasks(), vec![created.clone()]);
    assert_eq!(state.store.list().await, vec![created]);
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let (_state, repo) = start(TaskStore::new()).await;

    let err = repo.get(&TaskId::new("missing")).await.unwrap_err();
    assert_eq!(err, RepositoryError::NotFound(TaskId::new("missing")));

    let err = repo.remove(&TaskId::new("missing")).await.unwrap_err();
    assert_eq!(err, RepositoryError::NotFound(TaskId::new("missing")));
}

#[tokio::test]
async fn test_update_and_delete_round_trip() {
    let (state, repo) = start(TaskStore::seeded()).await;
    let engine = TaskEngine::new(repo);
    let count = engine.refresh().await.unwrap();
    assert!(count > 1);

    let first = engine.tasks()[0].clone();
    let patch = TaskPatch {
        status: Some(TaskStatus::Done),
        ..TaskPatch::default()
    };
    let updated = engine.update(&first.id, patch).await.unwrap();
    assert_eq!(updated.status, TaskStatus::Done);
    assert_eq!(updated.title, first.title);
    assert_eq!(state.store.get(&first.id).await.unwrap().status, TaskStatus::Done);

    engine.remove(&first.id).await.unwrap();
    assert!(state.store.get(&first.id).await.is_none());

    engine.refresh().await.unwrap();
    assert_eq!(engine.len(), count - 1);
    assert!(!engine.contains(&first.id));
}

#[tokio::test]
async fn test_fetch_reports_server_side_deletion() {
    let (state, repo) = start(TaskStore::seeded()).await;
    let engine = TaskEngine::new(repo);
    engine.refresh().await.unwrap();
    let id = engine.tasks()[0].id.clone();

    state.store.remove(&id).await.unwrap();

    let err = engine.fetch(&id).await.unwrap_err();
    assert_eq!(err, EngineError::NotFound(id));
}

#[tokio::test]
async fn test_unreachable_backend_rolls_back() {
    let repo = HttpRepository::new(&HttpConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        request_timeout: Duration::from_secs(2),
    })
    .unwrap();
    let engine = TaskEngine::new(repo);

    let create = engine.create(new_task("Offline"));
    assert_eq!(engine.len(), 1);

    let err = create.await.unwrap_err();
    assert!(matches!(err, EngineError::MutationFailed { .. }));
    assert!(engine.is_empty());
}

#[tokio::test]
async fn test_board_create_against_server() {
    let (state, repo) = start(TaskStore::seeded()).await;
    let (notifier, mut notices) = Notifier::channel(16, NoticeDurations::default());
    let mut board = Board::new(TaskEngine::new(repo), notifier, BoardConfig::default());
    board.load().await.unwrap();
    let before = board.view().rows.len();
    assert_eq!(board.users().len(), state.store.users().len());

    let form = TaskForm {
        title: "Review PR".to_string(),
        assignee: "Chioma".to_string(),
        due_date: "2025-06-10".to_string(),
        ..TaskForm::default()
    };
    let saved = board.submit_create(form).await.unwrap();

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.text, "Task saved!");

    let rows = board.view().rows;
    assert_eq!(rows.len(), before + 1);
    assert_eq!(rows.iter().filter(|t| t.id == saved.id).count(), 1);
    assert!(state.store.get(&saved.id).await.is_some());
}
