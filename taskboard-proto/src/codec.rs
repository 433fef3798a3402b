//! JSON encode/decode for the `Taskboard` REST payloads.
//!
//! Decoding is a typed deserialization followed by [`Task::validate`], so a
//! body that parses but breaks a boundary rule fails the same way as a body
//! that does not parse at all: with a [`ValidationError`].

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::task::{NewTask, Task, TaskPatch, User, ValidationError};

fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ValidationError> {
    serde_json::from_slice(bytes).map_err(|e| ValidationError::Malformed(e.to_string()))
}

/// Encodes any payload as JSON bytes.
///
/// # Errors
///
/// Returns [`ValidationError::Malformed`] if serialization fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ValidationError> {
    serde_json::to_vec(value).map_err(|e| ValidationError::Malformed(e.to_string()))
}

/// Decodes and validates a single task.
///
/// # Errors
///
/// Returns [`ValidationError::Malformed`] if the body is not a task, or the
/// rule violation reported by [`Task::validate`].
pub fn decode_task(bytes: &[u8]) -> Result<Task, ValidationError> {
    let task: Task = from_json(bytes)?;
    task.validate()?;
    Ok(task)
}

/// Decodes and validates a task listing. One bad record fails the listing.
///
/// # Errors
///
/// Same as [`decode_task`].
pub fn decode_task_list(bytes: &[u8]) -> Result<Vec<Task>, ValidationError> {
    let tasks: Vec<Task> = from_json(bytes)?;
    for task in &tasks {
        task.validate()?;
    }
    Ok(tasks)
}

/// Decodes and validates a create payload.
///
/// # Errors
///
/// Same as [`decode_task`].
pub fn decode_new_task(bytes: &[u8]) -> Result<NewTask, ValidationError> {
    let new: NewTask = from_json(bytes)?;
    new.validate()?;
    Ok(new)
}

/// Decodes and validates a patch payload.
///
/// # Errors
///
/// Same as [`decode_task`], checked only for fields the patch sets.
pub fn decode_patch(bytes: &[u8]) -> Result<TaskPatch, ValidationError> {
    let patch: TaskPatch = from_json(bytes)?;
    patch.validate()?;
    Ok(patch)
}

/// Decodes a user listing.
///
/// # Errors
///
/// Returns [`ValidationError::Malformed`] if the body is not a user list.
pub fn decode_user_list(bytes: &[u8]) -> Result<Vec<User>, ValidationError> {
    from_json(bytes)
}
