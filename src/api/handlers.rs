//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{ErrorResponse, TryOnActionRequest, TurnRequest};
use super::AppState;
use crate::runtime::{SessionHandle, UiAction};
use crate::state_machine::SessionState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/stream", get(stream_session))
        .route("/api/sessions/:id/turn", post(submit_turn))
        .route("/api/sessions/:id/actions/try-on", post(try_on))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionState>) {
    let handle = state.sessions.create().await;
    (StatusCode::CREATED, Json(handle.snapshot()))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionState>, AppError> {
    let handle = lookup(&state, &id).await?;
    Ok(Json(handle.snapshot()))
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = lookup(&state, &id).await?;
    // Subscribe before snapshotting so no checkpoint falls between the two
    let events = handle.subscribe();
    Ok(sse_stream(handle.snapshot(), events))
}

// ============================================================
// Entry points
// ============================================================

async fn submit_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<SessionState>, AppError> {
    let image = req
        .image
        .as_ref()
        .map(|attachment| attachment.decode())
        .transpose()
        .map_err(AppError::BadRequest)?;

    if req.text.trim().is_empty() && image.is_none() {
        return Err(AppError::BadRequest("A turn needs text or an image".to_string()));
    }

    let handle = lookup(&state, &id).await?;
    let mut runtime = handle
        .runtime
        .clone()
        .try_lock_owned()
        .map_err(|_| AppError::Busy(id.clone()))?;

    // Run to completion even if the client goes away
    let text = req.text;
    let task = tokio::spawn(async move {
        runtime.submit_user_turn(text, image).await;
        runtime.state().clone()
    });

    let snapshot = task
        .await
        .map_err(|e| AppError::Internal(format!("Turn task failed: {e}")))?;
    Ok(Json(snapshot))
}

async fn try_on(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TryOnActionRequest>,
) -> Result<Json<SessionState>, AppError> {
    let handle = lookup(&state, &id).await?;
    let mut runtime = handle
        .runtime
        .clone()
        .try_lock_owned()
        .map_err(|_| AppError::Busy(id.clone()))?;

    let action = UiAction::TryOn {
        product: req.product,
    };
    let task = tokio::spawn(async move {
        runtime.invoke_action(action).await;
        runtime.state().clone()
    });

    let snapshot = task
        .await
        .map_err(|e| AppError::Internal(format!("Try-on task failed: {e}")))?;
    Ok(Json(snapshot))
}

async fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

async fn lookup(state: &AppState, id: &str) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Busy(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Busy(id) => (
                StatusCode::CONFLICT,
                format!("Session {id} is still processing a turn"),
            ),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
