//! Property-based tests for the task wire format.
//!
//! Uses proptest to verify:
//! 1. Any valid `Task` survives encode → decode through the validating codec.
//! 2. Random bytes never cause a panic in any decoder (they return `Err`).
//! 3. Applying a patch never touches the fields the patch leaves unset.
//! 4. A decoded task always satisfies the boundary rules.

use proptest::prelude::*;
use taskboard_proto::codec;
use taskboard_proto::task::{Priority, Task, TaskId, TaskPatch, TaskStatus};

// --- Strategies for model types ---

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Todo),
        Just(TaskStatus::Doing),
        Just(TaskStatus::Done),
    ]
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
    ]
}

/// Strategy for ISO dates that always parse.
fn arb_due_date() -> impl Strategy<Value = String> {
    (1970i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}"))
}

/// Strategy for valid tasks (non-empty title and assignee).
fn arb_task() -> impl Strategy<Value = Task> {
    (
        "[a-z0-9]{1,12}",
        "[^\x00]{1,64}",
        arb_status(),
        "[^\x00]{1,32}",
        arb_priority(),
        arb_due_date(),
        proptest::option::of("[^\x00]{1,64}"),
    )
        .prop_map(
            |(id, title, status, assignee, priority, due_date, description)| Task {
                id: TaskId::new(id),
                title,
                status,
                assignee,
                priority,
                due_date,
                description,
            },
        )
}

fn arb_patch() -> impl Strategy<Value = TaskPatch> {
    (
        proptest::option::of("[^\x00]{1,32}"),
        proptest::option::of(arb_status()),
        proptest::option::of("[^\x00]{1,32}"),
        proptest::option::of(arb_priority()),
        proptest::option::of(arb_due_date()),
    )
        .prop_map(|(title, status, assignee, priority, due_date)| TaskPatch {
            title,
            status,
            assignee,
            priority,
            due_date,
            description: None,
        })
}

// --- Property tests ---

proptest! {
    /// Any valid task survives the validating codec unchanged.
    #[test]
    fn task_survives_codec(task in arb_task()) {
        let bytes = codec::encode(&task).expect("encode should succeed");
        let decoded = codec::decode_task(&bytes).expect("decode should succeed");
        prop_assert_eq!(task, decoded);
    }

    /// Random bytes never cause a panic in any decoder.
    #[test]
    fn random_bytes_decode_no_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = codec::decode_task(&bytes);
        let _ = codec::decode_task_list(&bytes);
        let _ = codec::decode_patch(&bytes);
        let _ = codec::decode_new_task(&bytes);
        let _ = codec::decode_user_list(&bytes);
    }

    /// Fields absent from a patch keep their previous values.
    #[test]
    fn patch_preserves_unset_fields(task in arb_task(), patch in arb_patch()) {
        let mut patched = task.clone();
        patched.apply_patch(&patch);

        prop_assert_eq!(&patched.id, &task.id);
        prop_assert_eq!(&patched.title, patch.title.as_ref().unwrap_or(&task.title));
        prop_assert_eq!(patched.status, patch.status.unwrap_or(task.status));
        prop_assert_eq!(&patched.assignee, patch.assignee.as_ref().unwrap_or(&task.assignee));
        prop_assert_eq!(patched.priority, patch.priority.unwrap_or(task.priority));
        prop_assert_eq!(&patched.due_date, patch.due_date.as_ref().unwrap_or(&task.due_date));
        prop_assert_eq!(&patched.description, &task.description);
    }

    /// Whatever the decoder accepts satisfies the boundary rules.
    #[test]
    fn decoded_tasks_are_valid(json in "\\{\"id\":\"[a-z]{0,3}\",\"title\":\"[a-z]{0,3}\",\"status\":\"(Todo|Doing|Done|Nope)\",\"assignee\":\"[a-z]{0,3}\",\"priority\":\"(Low|High)\",\"dueDate\":\"(2025-01-01|later|)\"\\}") {
        if let Ok(task) = codec::decode_task(json.as_bytes()) {
            prop_assert!(task.validate().is_ok());
            prop_assert!(!task.title.is_empty());
            prop_assert!(!task.assignee.is_empty());
        }
    }
}
