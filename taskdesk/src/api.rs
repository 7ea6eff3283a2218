//! HTTP access to the task service.
//!
//! [`TaskBackend`] is the seam between the data layer and the network: the
//! production implementation is [`HttpTaskApi`], and tests substitute an
//! in-process fake.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use taskdesk_proto::task::{Task, TaskFilter, TaskId, TaskStatus};
use taskdesk_proto::validate::FieldError;
use taskdesk_proto::wire::{DeleteResponse, ErrorBody, ProbeResponse, StatusPayload, TaskPayload};

/// Errors that can occur while talking to the task service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The data layer refused to issue the request because the server is
    /// known to be unreachable.
    #[error("offline: {reason}")]
    Offline {
        /// Why the server is considered unreachable.
        reason: String,
    },

    /// The TCP connection could not be established.
    #[error("cannot reach server: {0}")]
    Connect(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The requested task does not exist.
    #[error("task not found")]
    NotFound,

    /// The server rejected the request with field errors.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// The server rejected the request without field detail.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The server failed (5xx).
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the error body.
        message: String,
    },

    /// Any other non-success status.
    #[error("unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Message from the error body.
        message: String,
    },

    /// The response body did not decode.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The configured API URL is unusable.
    #[error("invalid API url: {0}")]
    InvalidUrl(String),

    /// Any other transport failure.
    #[error("request failed: {0}")]
    Request(String),
}

impl ClientError {
    /// Returns `true` for failures worth retrying on a read: connection
    /// errors, timeouts and 5xx responses. 4xx responses never are.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout | Self::Server { .. })
    }

    /// Returns `true` if this failure means the server is unreachable.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout | Self::Offline { .. })
    }

    fn from_status(status: StatusCode, body: Option<ErrorBody>) -> Self {
        let message = body
            .as_ref()
            .map_or_else(|| status.to_string(), |b| b.message.clone());
        match status {
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::BAD_REQUEST => match body.and_then(|b| b.errors) {
                Some(errors) if !errors.is_empty() => Self::Validation(errors),
                _ => Self::BadRequest(message),
            },
            s if s.is_server_error() => Self::Server {
                status: s.as_u16(),
                message,
            },
            s => Self::UnexpectedStatus {
                status: s.as_u16(),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// The operations the client needs from the task service.
pub trait TaskBackend: Send + Sync {
    /// Liveness probe (`GET /api/test`).
    fn probe(&self) -> impl Future<Output = Result<ProbeResponse, ClientError>> + Send;

    /// Tasks matching `filter`, sorted by due date.
    fn list(
        &self,
        filter: TaskFilter,
    ) -> impl Future<Output = Result<Vec<Task>, ClientError>> + Send;

    /// One task.
    fn get(&self, id: TaskId) -> impl Future<Output = Result<Task, ClientError>> + Send;

    /// Creates a task.
    fn create(
        &self,
        payload: &TaskPayload,
    ) -> impl Future<Output = Result<Task, ClientError>> + Send;

    /// Changes the fields present in `payload`.
    fn update(
        &self,
        id: TaskId,
        payload: &TaskPayload,
    ) -> impl Future<Output = Result<Task, ClientError>> + Send;

    /// Sets only the status.
    fn set_status(
        &self,
        id: TaskId,
        status: TaskStatus,
    ) -> impl Future<Output = Result<Task, ClientError>> + Send;

    /// Deletes a task.
    fn delete(&self, id: TaskId) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// [`TaskBackend`] over HTTP + JSON.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpTaskApi {
    /// Creates a client for the API rooted at `base_url`
    /// (e.g. `http://localhost:5000/api`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if `base_url` does not parse or
    /// cannot be a base, and [`ClientError::Request`] if the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut base =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        // Joining relative paths needs a trailing slash on the base.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::from)?;
        Ok(Self { client, base })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(ClientError::from);
    }
    let body = response.json::<ErrorBody>().await.ok();
    let err = ClientError::from_status(status, body);
    tracing::debug!(status = status.as_u16(), error = %err, "request rejected");
    Err(err)
}

impl TaskBackend for HttpTaskApi {
    async fn probe(&self) -> Result<ProbeResponse, ClientError> {
        let url = self.endpoint("test")?;
        decode(self.client.get(url).send().await?).await
    }

    async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>, ClientError> {
        let url = self.endpoint("tasks")?;
        let request = self.client.get(url).query(&filter.query_pairs());
        decode(request.send().await?).await
    }

    async fn get(&self, id: TaskId) -> Result<Task, ClientError> {
        let url = self.endpoint(&format!("tasks/{id}"))?;
        decode(self.client.get(url).send().await?).await
    }

    async fn create(&self, payload: &TaskPayload) -> Result<Task, ClientError> {
        let url = self.endpoint("tasks")?;
        decode(self.client.post(url).json(payload).send().await?).await
    }

    async fn update(&self, id: TaskId, payload: &TaskPayload) -> Result<Task, ClientError> {
        let url = self.endpoint(&format!("tasks/{id}"))?;
        decode(self.client.put(url).json(payload).send().await?).await
    }

    async fn set_status(&self, id: TaskId, status: TaskStatus) -> Result<Task, ClientError> {
        let url = self.endpoint(&format!("tasks/{id}/status"))?;
        let body = StatusPayload {
            status: Some(status.as_str().to_string()),
        };
        decode(self.client.patch(url).json(&body).send().await?).await
    }

    async fn delete(&self, id: TaskId) -> Result<(), ClientError> {
        let url = self.endpoint(&format!("tasks/{id}"))?;
        let _: DeleteResponse = decode(self.client.delete(url).send().await?).await?;
        Ok(())
    }
}
