//! Property tests for the reconciliation engine.
//!
//! Random sequences of overlapping creates, updates, deletes and refreshes,
//! some of them failing, must never leave two records with the same id, and
//! a final refresh must converge on the repository's contents.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use proptest::prelude::*;
use taskboard::repository::RepositoryError;
use taskboard::repository::memory::{MemoryRepository, Operation};
use taskboard::tasks::TaskEngine;
use taskboard_proto::task::{NewTask, Priority, TaskPatch, TaskStatus};

#[derive(Debug, Clone)]
enum Step {
    Create { fail: bool },
    Update { pick: usize, fail: bool },
    Remove { pick: usize, fail: bool },
    Refresh,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => any::<bool>().prop_map(|fail| Step::Create { fail }),
        2 => (any::<usize>(), any::<bool>()).prop_map(|(pick, fail)| Step::Update { pick, fail }),
        2 => (any::<usize>(), any::<bool>()).prop_map(|(pick, fail)| Step::Remove { pick, fail }),
        1 => Just(Step::Refresh),
    ]
}

fn new_task(n: usize) -> NewTask {
    NewTask {
        title: format!("task {n}"),
        status: TaskStatus::Todo,
        assignee: "Ana".to_string(),
        priority: Priority::Medium,
        due_date: "2025-01-01".to_string(),
        description: None,
    }
}

type Pending = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Starts one step against the engine. The optimistic part runs now; the
/// returned future settles it.
fn start(
    engine: &TaskEngine<MemoryRepository>,
    repo: &MemoryRepository,
    step: &Step,
    n: usize,
) -> Pending {
    let failure = || RepositoryError::Network("injected".to_string());
    let pick = |i: usize| {
        let tasks = engine.tasks();
        (!tasks.is_empty()).then(|| tasks[i % tasks.len()].id.clone())
    };
    match *step {
        Step::Create { fail } => {
            if fail {
                repo.fail_next(Operation::Create, failure());
            }
            let fut = engine.create(new_task(n));
            Box::pin(async move {
                let _ = fut.await;
            })
        }
        Step::Update { pick: i, fail } => {
            let Some(id) = pick(i) else {
                return Box::pin(async {});
            };
            if fail {
                repo.fail_next(Operation::Update, failure());
            }
            let patch = TaskPatch {
                status: Some(TaskStatus::Doing),
                ..TaskPatch::default()
            };
            let fut = engine.update(&id, patch);
            Box::pin(async move {
                let _ = fut.await;
            })
        }
        Step::Remove { pick: i, fail } => {
            let Some(id) = pick(i) else {
                return Box::pin(async {});
            };
            if fail {
                repo.fail_next(Operation::Remove, failure());
            }
            let fut = engine.remove(&id);
            Box::pin(async move {
                let _ = fut.await;
            })
        }
        Step::Refresh => {
            let engine = engine.clone();
            Box::pin(async move {
                let _ = engine.refresh().await;
            })
        }
    }
}

fn assert_unique(engine: &TaskEngine<MemoryRepository>) -> Result<(), TestCaseError> {
    let tasks = engine.tasks();
    let ids: HashSet<_> = tasks.iter().map(|t| t.id.clone()).collect();
    prop_assert_eq!(ids.len(), tasks.len(), "duplicate ids in {:?}", tasks);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ids_stay_unique_under_overlapping_mutations(
        steps in prop::collection::vec((arb_step(), arb_step()), 1..24)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let repo = MemoryRepository::new();
            for n in 0..3 {
                repo.seed(new_task(n));
            }
            let engine = TaskEngine::new(repo.clone());
            engine.refresh().await.unwrap();

            for (n, (first, second)) in steps.iter().enumerate() {
                let a = start(&engine, &repo, first, 2 * n);
                assert_unique(&engine)?;
                let b = start(&engine, &repo, second, 2 * n + 1);
                assert_unique(&engine)?;
                tokio::join!(a, b);
                assert_unique(&engine)?;
            }

            engine.refresh().await.unwrap();
            prop_assert_eq!(engine.tasks(), repo.snapshot());
            for task in engine.tasks() {
                prop_assert!(!engine.is_provisional(&task.id));
            }
            Ok(())
        })?;
    }
}
