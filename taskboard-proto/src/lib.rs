//! Shared data model and JSON wire format for `Taskboard`.

pub mod codec;
pub mod task;
