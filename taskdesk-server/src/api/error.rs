//! API error type and its JSON rendering.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use taskdesk_proto::validate::ValidationErrors;
use taskdesk_proto::wire::ErrorBody;

const VALIDATION_FAILED: &str = "Validation failed";
const TASK_NOT_FOUND: &str = "Task not found";
const INTERNAL_ERROR: &str = "Internal server error";

/// Everything a handler can fail with.
///
/// Store failures are converted by [`super::AppState::store_failure`], which
/// decides whether the detail may reach the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request violated one or more field rules.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// No task with the requested id.
    #[error("task not found")]
    NotFound,

    /// The request could not be decoded at all.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The store failed.
    #[error("internal error")]
    Internal {
        /// Failure detail, only set in development mode.
        detail: Option<String>,
    },
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body for this error.
    #[must_use]
    pub fn body(self) -> ErrorBody {
        match self {
            Self::Validation(errors) => ErrorBody {
                message: VALIDATION_FAILED.to_string(),
                errors: Some(errors.into_errors()),
            },
            Self::NotFound => ErrorBody {
                message: TASK_NOT_FOUND.to_string(),
                errors: None,
            },
            Self::BadRequest(message) => ErrorBody {
                message,
                errors: None,
            },
            Self::Internal { detail } => ErrorBody {
                message: detail.map_or_else(
                    || INTERNAL_ERROR.to_string(),
                    |detail| format!("{INTERNAL_ERROR}: {detail}"),
                ),
                errors: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.body())).into_response()
    }
}
