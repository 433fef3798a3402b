//! `Taskboard` reference server library.
//!
//! A small axum REST backend holding tasks in memory. Exposed as a library
//! so tests and demos can start it in-process on an ephemeral port.

pub mod api;
pub mod config;
pub mod store;
