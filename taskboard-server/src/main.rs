//! `Taskboard` reference server: in-memory REST backend for tasks.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:3001
//! cargo run --bin taskboard-server
//!
//! # Custom address with demo data
//! cargo run --bin taskboard-server -- --bind 127.0.0.1:8080 --seed
//!
//! # Or via environment variable
//! TASKBOARD_SERVER_ADDR=127.0.0.1:8080 cargo run --bin taskboard-server
//! ```

use std::sync::Arc;

use clap::Parser;
use taskboard_server::api::{self, ApiState};
use taskboard_server::config::Args;
use taskboard_server::store::TaskStore;

#[tokio::main]
async fn main() {
    let config = match Args::parse().settings() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, seed = config.seed, "starting taskboard server");

    let store = if config.seed {
        TaskStore::seeded()
    } else {
        TaskStore::new()
    };
    let state = Arc::new(ApiState::with_store(store));

    match api::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "task server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "task server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start task server");
            std::process::exit(1);
        }
    }
}
