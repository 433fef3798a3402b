//! Integration tests for optimistic mutations and their reconciliation.
//!
//! # Verification Focus
//!
//! - Failed create, update and delete restore the pre-mutation collection
//! - Deleted records come back at their original position with original values
//! - Interleaved mutations only roll back what they own
//! - Sorting, filtering and summary counts over a live engine
//! - The optimistic state is visible while the request is in flight
//! - A settled create leaves exactly one record carrying the repository's id

use taskboard::repository::{RepositoryError, TaskRepository};
use taskboard::repository::memory::{MemoryRepository, Operation};
use taskboard::tasks::{EngineError, FilterState, MutationOp, SortField, TaskEngine, derive};
use taskboard_proto::task::{NewTask, Priority, Task, TaskId, TaskPatch, TaskStatus};

fn new_task(title: &str, status: TaskStatus, priority: Priority, due: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        status,
        assignee: "Ana".to_string(),
        priority,
        due_date: due.to_string(),
        description: None,
    }
}

fn offline() -> RepositoryError {
    RepositoryError::Network("backend unreachable".to_string())
}

async fn seeded_engine() -> (MemoryRepository, TaskEngine<MemoryRepository>) {
    let repo = MemoryRepository::new();
    repo.seed(new_task("Write report", TaskStatus::Todo, Priority::Low, "2025-02-01"));
    repo.seed(new_task("Fix login", TaskStatus::Doing, Priority::High, "2025-01-15"));
    repo.seed(new_task("Ship release", TaskStatus::Done, Priority::Medium, "2025-01-20"));
    let engine = TaskEngine::new(repo.clone());
    engine.refresh().await.unwrap();
    (repo, engine)
}

fn titles(tasks: &[Task]) -> Vec<String> {
    tasks.iter().map(|t| t.title.clone()).collect()
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_failed_create_restores_collection() {
    let (repo, engine) = seeded_engine().await;
    let before = engine.tasks();
    repo.fail_next(Operation::Create, offline());

    let create = engine.create(new_task("Draft", TaskStatus::Todo, Priority::Low, "2025-03-01"));

    // Visible before the request settles.
    assert_eq!(engine.len(), 4);
    let provisional = engine.tasks().last().unwrap().id.clone();
    assert!(engine.is_provisional(&provisional));

    let err = create.await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::MutationFailed {
            op: MutationOp::Create,
            ..
        }
    ));
    assert_eq!(engine.tasks(), before);
    assert!(!engine.is_provisional(&provisional));
}

#[tokio::test]
async fn test_successful_create_swaps_in_server_record() {
    let (repo, engine) = seeded_engine().await;

    let created = engine
        .create(new_task("Draft", TaskStatus::Todo, Priority::Low, "2025-03-01"))
        .await
        .unwrap();

    assert_eq!(created.id, TaskId::new("4"));
    let tasks = engine.tasks();
    assert_eq!(tasks.len(), 4);
    assert_eq!(tasks.last().unwrap(), &created);
    assert!(!engine.is_provisional(&created.id));
    assert_eq!(repo.snapshot().len(), 4);
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_failed_update_restores_prior_values() {
    let (repo, engine) = seeded_engine().await;
    let before = engine.tasks();
    repo.fail_next(Operation::Update, offline());

    let patch = TaskPatch {
        status: Some(TaskStatus::Done),
        title: Some("Fix login for real".to_string()),
        ..TaskPatch::default()
    };
    let update = engine.update(&TaskId::new("2"), patch);

    let optimistic = engine.get(&TaskId::new("2")).unwrap();
    assert_eq!(optimistic.status, TaskStatus::Done);
    assert_eq!(optimistic.title, "Fix login for real");

    assert!(update.await.is_err());
    assert_eq!(engine.tasks(), before);
}

#[tokio::test]
async fn test_update_of_missing_task_never_reaches_repository() {
    let (repo, engine) = seeded_engine().await;

    let err = engine
        .update(&TaskId::new("99"), TaskPatch::default())
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::NotFound(TaskId::new("99")));
    assert_eq!(repo.calls(Operation::Update), 0);
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_failed_delete_restores_position_and_values() {
    let (repo, engine) = seeded_engine().await;
    let before = engine.tasks();
    repo.fail_next(Operation::Remove, offline());

    let remove = engine.remove(&TaskId::new("2"));
    assert_eq!(titles(&engine.tasks()), ["Write report", "Ship release"]);

    let err = remove.await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::MutationFailed {
            op: MutationOp::Delete,
            ..
        }
    ));
    assert_eq!(engine.tasks(), before);
    assert_eq!(engine.tasks()[1].id, TaskId::new("2"));
}

#[tokio::test]
async fn test_failed_delete_does_not_undo_concurrent_create() {
    let (repo, engine) = seeded_engine().await;
    repo.fail_next(Operation::Remove, offline());

    let remove = engine.remove(&TaskId::new("1"));
    let create = engine.create(new_task("Later", TaskStatus::Todo, Priority::Low, "2025-04-01"));

    let (removed, created) = tokio::join!(remove, create);
    assert!(removed.is_err());
    let created = created.unwrap();

    let tasks = engine.tasks();
    assert_eq!(tasks.len(), 4);
    assert_eq!(tasks[0].id, TaskId::new("1"));
    assert!(tasks.iter().any(|t| t.id == created.id));
}

// =============================================================================
// In-flight visibility
// =============================================================================

#[tokio::test]
async fn test_optimistic_state_visible_while_request_is_held() {
    let (repo, engine) = seeded_engine().await;
    repo.pause();

    let handle = tokio::spawn(engine.remove(&TaskId::new("3")));
    tokio::task::yield_now().await;
    assert!(!engine.contains(&TaskId::new("3")));
    assert_eq!(repo.snapshot().len(), 3);

    repo.resume();
    handle.await.unwrap().unwrap();
    assert_eq!(repo.snapshot().len(), 2);
    assert_eq!(engine.len(), 2);
}

// =============================================================================
// Derived view over the engine
// =============================================================================

#[tokio::test]
async fn test_sort_by_priority_then_toggle() {
    let (_repo, engine) = seeded_engine().await;
    let mut filter = FilterState::default();

    filter.toggle_sort(SortField::Priority);
    let view = derive(&engine.tasks(), &filter);
    assert_eq!(titles(&view.rows), ["Fix login", "Ship release", "Write report"]);

    filter.toggle_sort(SortField::Priority);
    let view = derive(&engine.tasks(), &filter);
    assert_eq!(titles(&view.rows), ["Write report", "Ship release", "Fix login"]);
}

#[tokio::test]
async fn test_sort_by_due_date() {
    let (_repo, engine) = seeded_engine().await;
    let mut filter = FilterState::default();
    filter.toggle_sort(SortField::DueDate);

    let view = derive(&engine.tasks(), &filter);
    assert_eq!(titles(&view.rows), ["Fix login", "Ship release", "Write report"]);
}

#[tokio::test]
async fn test_filter_and_summary() {
    let (_repo, engine) = seeded_engine().await;
    let filter = FilterState {
        search_text: "LOGIN".to_string(),
        status_filter: Some(TaskStatus::Doing),
        ..FilterState::default()
    };

    let view = derive(&engine.tasks(), &filter);
    assert_eq!(titles(&view.rows), ["Fix login"]);
    assert_eq!(view.summary.total, 3);
    assert_eq!(view.summary.todo, 1);
    assert_eq!(view.summary.in_progress, 1);
    assert_eq!(view.summary.done, 1);
}

#[tokio::test]
async fn test_search_and_status_filter_compose() {
    let repo = MemoryRepository::new();
    repo.seed(new_task("Fix bug", TaskStatus::Todo, Priority::High, "2025-01-01"));
    repo.seed(NewTask {
        assignee: "Ben".to_string(),
        ..new_task("Write docs", TaskStatus::Done, Priority::Low, "2025-01-02")
    });
    let engine = TaskEngine::new(repo);
    engine.refresh().await.unwrap();
    let tasks = engine.tasks();

    let mut filter = FilterState {
        search_text: "bug".to_string(),
        ..FilterState::default()
    };
    assert_eq!(titles(&derive(&tasks, &filter).rows), ["Fix bug"]);

    filter.search_text.clear();
    filter.status_filter = Some(TaskStatus::Done);
    let rows = derive(&tasks, &filter).rows;
    assert_eq!(titles(&rows), ["Write docs"]);
    assert_eq!(rows[0].assignee, "Ben");

    filter.search_text = "bug".to_string();
    assert!(derive(&tasks, &filter).rows.is_empty());
}

// =============================================================================
// Server-assigned ids
// =============================================================================

#[tokio::test]
async fn test_create_adopts_repository_id() {
    let retired = Task::from_new(
        TaskId::new("41"),
        new_task("Retired", TaskStatus::Done, Priority::Low, "2024-12-01"),
    );
    let repo = MemoryRepository::with_tasks(vec![retired]);
    repo.remove(&TaskId::new("41")).await.unwrap();
    let engine = TaskEngine::new(repo.clone());
    engine.refresh().await.unwrap();
    assert!(engine.is_empty());

    let created = engine
        .create(NewTask {
            title: "T".to_string(),
            status: TaskStatus::Todo,
            assignee: "A".to_string(),
            priority: Priority::Medium,
            due_date: "2025-01-01".to_string(),
            description: None,
        })
        .await
        .unwrap();

    assert_eq!(created.id, TaskId::new("42"));
    let tasks = engine.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, TaskId::new("42"));
    assert_eq!(tasks[0].title, "T");
    assert!(tasks.iter().all(|t| !t.id.as_str().starts_with("tmp-")));
    assert_eq!(repo.snapshot(), tasks);
}
