//! Request handlers.
//!
//! Each task handler validates the raw request, makes exactly one store
//! call, and renders the result. Extractor rejections are caught so that a
//! malformed body produces the same JSON error shape as a validation failure.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use serde_json::{Value, json};

use taskdesk_proto::task::{Task, TaskId};
use taskdesk_proto::validate::{
    validate_create, validate_filter, validate_status_change, validate_update,
};
use taskdesk_proto::wire::{DeleteResponse, FilterQuery, ProbeResponse, StatusPayload, TaskPayload};

use super::{ApiError, AppState};
use crate::store::TaskStore;

const AVAILABLE_ROUTES: [&str; 3] = ["/api/tasks", "/api/test", "/"];

type Shared<S> = State<Arc<AppState<S>>>;

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text())))
}

/// `GET /api/tasks`
pub async fn list_tasks<S: TaskStore>(
    State(state): Shared<S>,
    query: Result<Query<FilterQuery>, QueryRejection>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    })?;
    let filter = validate_filter(&query)?;
    let tasks = state
        .store
        .list(filter)
        .await
        .map_err(|e| state.store_failure(e))?;
    tracing::debug!(count = tasks.len(), ?filter, "listed tasks");
    Ok(Json(tasks))
}

/// `GET /api/tasks/{id}`
///
/// A malformed id names no task, so it is reported as not found.
pub async fn get_task<S: TaskStore>(
    State(state): Shared<S>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id: TaskId = id.parse().map_err(|_| ApiError::NotFound)?;
    let task = state.store.get(id).await.map_err(|e| state.store_failure(e))?;
    Ok(Json(task))
}

/// `POST /api/tasks`
pub async fn create_task<S: TaskStore>(
    State(state): Shared<S>,
    body: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let fields = validate_create(&json_body(body)?)?;
    let task = state
        .store
        .create(fields)
        .await
        .map_err(|e| state.store_failure(e))?;
    tracing::info!(id = %task.id, title = %task.title, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// `PUT /api/tasks/{id}`
///
/// Only the fields present in the body change. The body is validated before
/// the id is looked up.
pub async fn update_task<S: TaskStore>(
    State(state): Shared<S>,
    Path(id): Path<String>,
    body: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let (id, changes) = validate_update(&id, &json_body(body)?)?;
    let task = state
        .store
        .replace(id, changes)
        .await
        .map_err(|e| state.store_failure(e))?;
    tracing::info!(id = %task.id, "task updated");
    Ok(Json(task))
}

/// `PATCH /api/tasks/{id}/status`
pub async fn set_task_status<S: TaskStore>(
    State(state): Shared<S>,
    Path(id): Path<String>,
    body: Result<Json<StatusPayload>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let (id, status) = validate_status_change(&id, &json_body(body)?)?;
    let task = state
        .store
        .set_status(id, status)
        .await
        .map_err(|e| state.store_failure(e))?;
    tracing::info!(id = %task.id, %status, "task status changed");
    Ok(Json(task))
}

/// `DELETE /api/tasks/{id}`
pub async fn delete_task<S: TaskStore>(
    State(state): Shared<S>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id: TaskId = id.parse().map_err(|_| ApiError::NotFound)?;
    let removed = state
        .store
        .delete(id)
        .await
        .map_err(|e| state.store_failure(e))?;
    tracing::info!(id = %removed.id, "task deleted");
    Ok(Json(DeleteResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

/// `GET /api/test`: liveness probe, always 200 while the process is up.
pub async fn probe<S: TaskStore>(State(state): Shared<S>) -> Json<ProbeResponse> {
    Json(ProbeResponse {
        message: "Backend server is running".to_string(),
        timestamp: taskdesk_proto::task::now(),
        store: state.store.health(),
    })
}

/// `GET /`
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Task Management API",
        "status": "running",
        "endpoints": {
            "tasks": "/api/tasks",
            "test": "/api/test",
        },
    }))
}

/// Fallback for unknown paths.
pub async fn route_not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "message": format!("Route {uri} not found"),
            "availableRoutes": AVAILABLE_ROUTES,
        })),
    )
}
