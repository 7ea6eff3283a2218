//! HTTP surface of the task service.
//!
//! [`router`] wires the handlers in [`handlers`] over a shared
//! [`AppState`]. Handlers are generic over the [`TaskStore`] backend, so the
//! same router serves the in-memory and the file-backed store.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch};
use tower_http::trace::TraceLayer;

use crate::store::{StoreError, TaskStore};
pub use error::ApiError;

/// Default request body cap (10 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Request handling knobs taken from the server configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiSettings {
    /// Include store failure detail in 500 bodies (development mode).
    pub expose_internal_errors: bool,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            expose_internal_errors: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState<S> {
    /// Task persistence backend.
    pub store: S,
    /// Request handling settings.
    pub settings: ApiSettings,
}

impl<S: TaskStore> AppState<S> {
    /// Creates handler state over `store`.
    #[must_use]
    pub const fn new(store: S, settings: ApiSettings) -> Self {
        Self { store, settings }
    }

    /// Maps a store error to its API error, logging anything unexpected.
    pub(crate) fn store_failure(&self, err: StoreError) -> ApiError {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            other => {
                tracing::error!(error = %other, "store operation failed");
                ApiError::Internal {
                    detail: self
                        .settings
                        .expose_internal_errors
                        .then(|| other.to_string()),
                }
            }
        }
    }
}

/// Builds the application router.
pub fn router<S: TaskStore>(state: Arc<AppState<S>>) -> Router {
    let body_limit = state.settings.max_body_bytes;
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/test", get(handlers::probe::<S>))
        .route(
            "/api/tasks",
            get(handlers::list_tasks::<S>).post(handlers::create_task::<S>),
        )
        .route(
            "/api/tasks/{id}",
            get(handlers::get_task::<S>)
                .put(handlers::update_task::<S>)
                .delete(handlers::delete_task::<S>),
        )
        .route("/api/tasks/{id}/status", patch(handlers::set_task_status::<S>))
        .fallback(handlers::route_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
