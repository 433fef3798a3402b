//! REST repository backed by `reqwest`.
//!
//! Maps the [`TaskRepository`] contract onto the backend's routes:
//! `GET /tasks`, `GET /tasks/{id}`, `POST /tasks`, `PATCH /tasks/{id}`,
//! `DELETE /tasks/{id}` and `GET /users`. Response bodies are decoded with
//! the validating codec from `taskboard_proto`.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use taskboard_proto::codec;
use taskboard_proto::task::{NewTask, Task, TaskId, TaskPatch, User, ValidationError};
use url::Url;

use super::{RepositoryError, TaskRepository};

/// Connection settings for [`HttpRepository`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Backend base URL, e.g. `http://localhost:3001`.
    pub base_url: String,
    /// Per-request timeout; expiry is reported as a network error.
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// [`TaskRepository`] talking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRepository {
    base_url: Url,
    http: Client,
}

impl HttpRepository {
    /// Builds a repository for the given backend.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Network`] if the base URL does not parse,
    /// cannot carry a path, or the HTTP client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self, RepositoryError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            RepositoryError::Network(format!("invalid base url {:?}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RepositoryError::Network(format!(
                "base url cannot carry a path: {base_url}"
            )));
        }
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RepositoryError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { base_url, http })
    }

    /// Returns the backend base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RepositoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RepositoryError::Network(format!("bad base url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<RequestBuilder, RepositoryError> {
        Ok(self.http.request(method, self.endpoint(segments)?))
    }

    /// Sends a request and returns the body of a successful response.
    ///
    /// 404 becomes [`RepositoryError::NotFound`] when `target` names a task;
    /// 400/422 become [`RepositoryError::Validation`]; any other failure is a
    /// [`RepositoryError::Network`].
    async fn send(
        &self,
        request: RequestBuilder,
        target: Option<&TaskId>,
    ) -> Result<Vec<u8>, RepositoryError> {
        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RepositoryError::Network("request timed out".to_string())
            } else {
                RepositoryError::Network(e.to_string())
            }
        })?;

        let status = resp.status();
        let url = resp.url().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| RepositoryError::Network(format!("failed to read response: {e}")))?;

        match (status, target) {
            (s, _) if s.is_success() => Ok(body.to_vec()),
            (StatusCode::NOT_FOUND, Some(id)) => Err(RepositoryError::NotFound(id.clone())),
            (StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY, _) => {
                let detail = String::from_utf8_lossy(&body).into_owned();
                Err(ValidationError::Malformed(detail).into())
            }
            (s, _) => Err(RepositoryError::Network(format!("{url} returned {s}"))),
        }
    }
}

impl TaskRepository for HttpRepository {
    async fn list(&self) -> Result<Vec<Task>, RepositoryError> {
        let request = self.request(Method::GET, &["tasks"])?;
        let body = self.send(request, None).await?;
        let tasks = codec::decode_task_list(&body)?;
        tracing::debug!(count = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    async fn get(&self, id: &TaskId) -> Result<Task, RepositoryError> {
        let request = self.request(Method::GET, &["tasks", id.as_str()])?;
        let body = self.send(request, Some(id)).await?;
        Ok(codec::decode_task(&body)?)
    }

    async fn create(&self, task: &NewTask) -> Result<Task, RepositoryError> {
        let request = self.request(Method::POST, &["tasks"])?.json(task);
        let body = self.send(request, None).await?;
        Ok(codec::decode_task(&body)?)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RepositoryError> {
        let request = self
            .request(Method::PATCH, &["tasks", id.as_str()])?
            .json(patch);
        let body = self.send(request, Some(id)).await?;
        Ok(codec::decode_task(&body)?)
    }

    async fn remove(&self, id: &TaskId) -> Result<(), RepositoryError> {
        let request = self.request(Method::DELETE, &["tasks", id.as_str()])?;
        self.send(request, Some(id)).await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let request = self.request(Method::GET, &["users"])?;
        let body = self.send(request, None).await?;
        Ok(codec::decode_user_list(&body)?)
    }
}
