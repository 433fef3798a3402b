//! `Taskboard`: a task board that applies edits optimistically and
//! reconciles them with a REST backend.

pub mod app;
pub mod board;
pub mod config;
pub mod notify;
pub mod repository;
pub mod tasks;
pub mod ui;
