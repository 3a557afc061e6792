use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::{
        question::{
            BulkImportRequest, CsvImportRequest, GlobalTimeRequest, GridResponse, ImportSummary,
            QuestionInput, QuestionStats, QuestionSummary,
        },
        session::ActionResponse,
    },
    error::AppError,
    services::question_service,
    state::SharedState,
};

/// Routes handling the question bank and the selection grids.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/questions", get(list_questions).post(add_question))
        .route("/questions/stats", get(question_stats))
        .route("/questions/bulk", post(bulk_import))
        .route("/questions/import-csv", post(import_csv))
        .route("/questions/time", put(apply_global_time))
        .route("/questions/reset", post(reset_questions))
        .route("/questions/grid/{part}", get(grid))
}

/// Every question of the bank.
#[utoipa::path(
    get,
    path = "/questions",
    tag = "questions",
    responses((status = 200, description = "Question bank", body = [QuestionSummary]))
)]
pub async fn list_questions(State(state): State<SharedState>) -> Json<Vec<QuestionSummary>> {
    Json(question_service::list_questions(&state).await)
}

/// Append one question.
#[utoipa::path(
    post,
    path = "/questions",
    tag = "questions",
    request_body = QuestionInput,
    responses(
        (status = 200, description = "Question added", body = QuestionSummary),
        (status = 400, description = "Invalid question")
    )
)]
pub async fn add_question(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<QuestionInput>>,
) -> Result<Json<QuestionSummary>, AppError> {
    let summary = question_service::add_question(&state, payload).await?;
    Ok(Json(summary))
}

/// Bank size per part and consumed cells.
#[utoipa::path(
    get,
    path = "/questions/stats",
    tag = "questions",
    responses((status = 200, description = "Bank statistics", body = QuestionStats))
)]
pub async fn question_stats(State(state): State<SharedState>) -> Json<QuestionStats> {
    Json(question_service::stats(&state).await)
}

/// Append questions from pipe-separated lines.
#[utoipa::path(
    post,
    path = "/questions/bulk",
    tag = "questions",
    request_body = BulkImportRequest,
    responses(
        (status = 200, description = "Questions appended", body = ImportSummary),
        (status = 400, description = "No valid line")
    )
)]
pub async fn bulk_import(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<BulkImportRequest>>,
) -> Result<Json<ImportSummary>, AppError> {
    let summary = question_service::bulk_import(&state, &payload.text).await?;
    Ok(Json(summary))
}

/// Replace the bank from CSV text or the configured CSV file.
#[utoipa::path(
    post,
    path = "/questions/import-csv",
    tag = "questions",
    request_body = CsvImportRequest,
    responses(
        (status = 200, description = "Bank replaced", body = ImportSummary),
        (status = 503, description = "CSV source unreadable")
    )
)]
pub async fn import_csv(
    State(state): State<SharedState>,
    Json(payload): Json<CsvImportRequest>,
) -> Result<Json<ImportSummary>, AppError> {
    let summary = question_service::import_csv(&state, payload).await?;
    Ok(Json(summary))
}

/// Overwrite every question's time budget.
#[utoipa::path(
    put,
    path = "/questions/time",
    tag = "questions",
    request_body = GlobalTimeRequest,
    responses((status = 200, description = "Time applied", body = ActionResponse))
)]
pub async fn apply_global_time(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<GlobalTimeRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    let updated = question_service::apply_global_time(&state, payload.seconds).await?;
    Ok(Json(ActionResponse::new(format!(
        "{} seconds applied to {updated} questions",
        payload.seconds
    ))))
}

/// Reload and shuffle the bank, clearing consumed cells only.
#[utoipa::path(
    post,
    path = "/questions/reset",
    tag = "questions",
    responses(
        (status = 200, description = "Bank reshuffled", body = QuestionStats),
        (status = 503, description = "CSV source or storage unavailable")
    )
)]
pub async fn reset_questions(
    State(state): State<SharedState>,
) -> Result<Json<QuestionStats>, AppError> {
    let stats = question_service::reset_questions_only(&state).await?;
    Ok(Json(stats))
}

/// Grid of one part with the status of every cell.
#[utoipa::path(
    get,
    path = "/questions/grid/{part}",
    tag = "questions",
    params(("part" = u8, Path, description = "Part of the show (1 or 2)")),
    responses(
        (status = 200, description = "Grid cells", body = GridResponse),
        (status = 400, description = "Unknown part")
    )
)]
pub async fn grid(
    State(state): State<SharedState>,
    Path(part): Path<u8>,
) -> Result<Json<GridResponse>, AppError> {
    let grid = question_service::grid(&state, part).await?;
    Ok(Json(grid))
}
