use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::session::{ActionResponse, ExportResponse, LoginRequest, RestoreRequest, SessionStatus},
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Routes handling operator login, full resets, backup and restore.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session", get(session_status))
        .route("/session/login", post(login))
        .route("/session/logout", post(logout))
        .route("/session/reset", post(reset_all))
        .route("/session/clear", post(clear_all))
        .route("/session/export", get(export))
        .route("/session/restore", post(restore))
}

/// Login flag, degraded mode and console phase.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses((status = 200, description = "Session status", body = SessionStatus))
)]
pub async fn session_status(State(state): State<SharedState>) -> Json<SessionStatus> {
    Json(session_service::status(&state).await)
}

/// Check operator credentials.
#[utoipa::path(
    post,
    path = "/session/login",
    tag = "session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ActionResponse),
        (status = 401, description = "Wrong credentials")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<LoginRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    session_service::login(&state, payload).await?;
    Ok(Json(ActionResponse::new("logged in")))
}

/// Clear the login flag.
#[utoipa::path(
    post,
    path = "/session/logout",
    tag = "session",
    responses((status = 200, description = "Logged out", body = ActionResponse))
)]
pub async fn logout(State(state): State<SharedState>) -> Result<Json<ActionResponse>, AppError> {
    session_service::logout(&state).await?;
    Ok(Json(ActionResponse::new("logged out")))
}

/// Empty every stored key and reload the bank from the configured CSV.
#[utoipa::path(
    post,
    path = "/session/reset",
    tag = "session",
    responses(
        (status = 200, description = "Everything reset", body = ActionResponse),
        (status = 409, description = "A presentation is open")
    )
)]
pub async fn reset_all(State(state): State<SharedState>) -> Result<Json<ActionResponse>, AppError> {
    let count = session_service::reset_all(&state).await?;
    Ok(Json(ActionResponse::new(format!(
        "reset complete, {count} questions loaded"
    ))))
}

/// Empty every stored key.
#[utoipa::path(
    post,
    path = "/session/clear",
    tag = "session",
    responses(
        (status = 200, description = "Everything cleared", body = ActionResponse),
        (status = 409, description = "A presentation is open")
    )
)]
pub async fn clear_all(State(state): State<SharedState>) -> Result<Json<ActionResponse>, AppError> {
    session_service::clear_all(&state).await?;
    Ok(Json(ActionResponse::new("all data cleared")))
}

/// Dump every stored document.
#[utoipa::path(
    get,
    path = "/session/export",
    tag = "session",
    responses((status = 200, description = "Exported data", body = ExportResponse))
)]
pub async fn export(State(state): State<SharedState>) -> Json<ExportResponse> {
    Json(session_service::export(&state).await)
}

/// Write a backup produced by `/session/export` back to the store.
#[utoipa::path(
    post,
    path = "/session/restore",
    tag = "session",
    request_body = RestoreRequest,
    responses(
        (status = 200, description = "Backup restored", body = ActionResponse),
        (status = 400, description = "Malformed backup entry"),
        (status = 409, description = "A presentation is open")
    )
)]
pub async fn restore(
    State(state): State<SharedState>,
    Json(payload): Json<RestoreRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let count = session_service::restore(&state, payload.documents).await?;
    Ok(Json(ActionResponse::new(format!(
        "restored {count} documents"
    ))))
}
