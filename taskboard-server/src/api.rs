//! REST API: shared state, route table, and request handlers.
//!
//! Routes:
//! - `GET    /tasks`       list every task in insertion order
//! - `GET    /tasks/{id}`  fetch one task (404 if unknown)
//! - `POST   /tasks`       create from a `NewTask` body (201)
//! - `PATCH  /tasks/{id}`  merge a `TaskPatch` body (404 if unknown)
//! - `DELETE /tasks/{id}`  remove a task (204, 404 if unknown)
//! - `GET    /users`       list known users
//!
//! Request bodies go through the same validating codec the client uses, so
//! a body that breaks a boundary rule is rejected with 422.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use taskboard_proto::codec;
use taskboard_proto::task::{Task, TaskId, User, ValidationError};

use crate::store::TaskStore;

/// Shared server state.
pub struct ApiState {
    /// Task table.
    pub store: TaskStore,
}

impl Default for ApiState {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiState {
    /// Creates state with an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: TaskStore::new(),
        }
    }

    /// Creates state around an existing store.
    #[must_use]
    pub const fn with_store(store: TaskStore) -> Self {
        Self { store }
    }
}

/// Errors a handler can answer with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No task with this id.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// Request body failed validation.
    #[error("invalid request body: {0}")]
    Invalid(#[from] ValidationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Builds the route table around the given state.
pub fn router(state: Arc<ApiState>) -> axum::Router {
    axum::Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/users", get(list_users))
        .with_state(state)
}

/// Starts the server on `addr` with an empty store.
///
/// # Errors
///
/// Returns an error if the listener cannot bind.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(ApiState::new())).await
}

/// Starts the server with a pre-built [`ApiState`].
///
/// Returns the bound address (useful with port `0`) and the serve task.
///
/// # Errors
///
/// Returns an error if the listener cannot bind.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<ApiState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "task server error");
        }
    });

    Ok((bound_addr, handle))
}

async fn list_tasks(State(state): State<Arc<ApiState>>) -> Json<Vec<Task>> {
    let tasks = state.store.list().await;
    tracing::debug!(count = tasks.len(), "listing tasks");
    Json(tasks)
}

async fn get_task(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = TaskId::new(id);
    state
        .store
        .get(&id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

async fn create_task(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let new = codec::decode_new_task(&body).inspect_err(|e| {
        tracing::warn!(error = %e, "rejected create body");
    })?;
    let task = state.store.create(new).await;
    tracing::info!(task_id = %task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Task>, ApiError> {
    let id = TaskId::new(id);
    let patch = codec::decode_patch(&body).inspect_err(|e| {
        tracing::warn!(task_id = %id, error = %e, "rejected patch body");
    })?;
    let task = state
        .store
        .update(&id, &patch)
        .await
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;
    tracing::info!(task_id = %id, "task updated");
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = TaskId::new(id);
    if state.store.remove(&id).await.is_none() {
        return Err(ApiError::NotFound(id));
    }
    tracing::info!(task_id = %id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_users(State(state): State<Arc<ApiState>>) -> Json<Vec<User>> {
    Json(state.store.users().to_vec())
}
