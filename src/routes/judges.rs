use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::{
        judge::{JudgeInput, JudgeSummary},
        session::ActionResponse,
    },
    error::AppError,
    services::judge_service,
    state::SharedState,
};

/// Routes handling the judge panel.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/judges", get(list_judges).post(create_judge))
        .route("/judges/available", get(available_judges))
        .route("/judges/reset", post(reset_final_round))
        .route("/judges/{id}", put(update_judge).delete(delete_judge))
}

/// Every judge with its usage flag.
#[utoipa::path(
    get,
    path = "/judges",
    tag = "judges",
    responses((status = 200, description = "Judges", body = [JudgeSummary]))
)]
pub async fn list_judges(State(state): State<SharedState>) -> Json<Vec<JudgeSummary>> {
    Json(judge_service::list_judges(&state).await)
}

/// Judges whose challenge has not been played.
#[utoipa::path(
    get,
    path = "/judges/available",
    tag = "judges",
    responses((status = 200, description = "Selectable judges", body = [JudgeSummary]))
)]
pub async fn available_judges(State(state): State<SharedState>) -> Json<Vec<JudgeSummary>> {
    Json(judge_service::available_judges(&state).await)
}

/// Register a judge with its challenge questions.
#[utoipa::path(
    post,
    path = "/judges",
    tag = "judges",
    request_body = JudgeInput,
    responses(
        (status = 200, description = "Judge created", body = JudgeSummary),
        (status = 400, description = "Invalid judge")
    )
)]
pub async fn create_judge(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<JudgeInput>>,
) -> Result<Json<JudgeSummary>, AppError> {
    let judge = judge_service::create_judge(&state, payload).await?;
    Ok(Json(judge))
}

/// Replace a judge definition.
#[utoipa::path(
    put,
    path = "/judges/{id}",
    tag = "judges",
    request_body = JudgeInput,
    params(("id" = String, Path, description = "Judge identifier")),
    responses(
        (status = 200, description = "Judge updated", body = JudgeSummary),
        (status = 404, description = "Unknown judge")
    )
)]
pub async fn update_judge(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<JudgeInput>>,
) -> Result<Json<JudgeSummary>, AppError> {
    let judge = judge_service::update_judge(&state, &id, payload).await?;
    Ok(Json(judge))
}

/// Remove a judge.
#[utoipa::path(
    delete,
    path = "/judges/{id}",
    tag = "judges",
    params(("id" = String, Path, description = "Judge identifier")),
    responses(
        (status = 200, description = "Judge deleted", body = ActionResponse),
        (status = 404, description = "Unknown judge")
    )
)]
pub async fn delete_judge(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    judge_service::delete_judge(&state, &id).await?;
    Ok(Json(ActionResponse::new("judge deleted")))
}

/// Forget which judges and challenge questions were played.
#[utoipa::path(
    post,
    path = "/judges/reset",
    tag = "judges",
    responses((status = 200, description = "Final round reset", body = ActionResponse))
)]
pub async fn reset_final_round(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    judge_service::reset_final_round(&state).await?;
    Ok(Json(ActionResponse::new("final round reset")))
}
