use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::console::{
        AnswerRequest, AnswerResponse, ConsoleSnapshot, SelectQuestionRequest,
        StartChallengeRequest, SubAnswerRequest, SubAnswerResponse,
    },
    error::AppError,
    services::console_service,
    state::SharedState,
};

/// Routes driving the presentation: grid picks, answers and judge challenges.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/console", get(console_snapshot))
        .route("/console/select", post(select_question))
        .route("/console/answer", post(submit_answer))
        .route("/console/reveal", post(reveal_answer))
        .route("/console/challenge", post(start_challenge))
        .route("/console/challenge/answer", post(answer_sub_question))
        .route("/console/close", post(close))
}

/// What the display currently shows.
#[utoipa::path(
    get,
    path = "/console",
    tag = "console",
    responses((status = 200, description = "Console snapshot", body = ConsoleSnapshot))
)]
pub async fn console_snapshot(State(state): State<SharedState>) -> Json<ConsoleSnapshot> {
    Json(console_service::snapshot(&state).await)
}

/// Consume a grid cell and show its question.
#[utoipa::path(
    post,
    path = "/console/select",
    tag = "console",
    request_body = SelectQuestionRequest,
    responses(
        (status = 200, description = "Question shown", body = ConsoleSnapshot),
        (status = 400, description = "Cell out of range"),
        (status = 409, description = "Cell already used or a presentation is open"),
        (status = 422, description = "Cell beyond the question bank")
    )
)]
pub async fn select_question(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SelectQuestionRequest>>,
) -> Result<Json<ConsoleSnapshot>, AppError> {
    let snapshot = console_service::select_question(&state, payload.part, payload.index).await?;
    Ok(Json(snapshot))
}

/// Submit the operator's pick on the open question.
#[utoipa::path(
    post,
    path = "/console/answer",
    tag = "console",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer marked", body = AnswerResponse),
        (status = 409, description = "No question accepting answers")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AnswerRequest>>,
) -> Result<Json<AnswerResponse>, AppError> {
    let outcome = console_service::submit_answer(&state, &payload.letter).await?;
    Ok(Json(outcome))
}

/// Reveal the answer of the open question.
#[utoipa::path(
    post,
    path = "/console/reveal",
    tag = "console",
    responses(
        (status = 200, description = "Answer revealed", body = ConsoleSnapshot),
        (status = 409, description = "Nothing to reveal")
    )
)]
pub async fn reveal_answer(
    State(state): State<SharedState>,
) -> Result<Json<ConsoleSnapshot>, AppError> {
    let snapshot = console_service::reveal_answer(&state).await?;
    Ok(Json(snapshot))
}

/// Start the challenge of a judge.
#[utoipa::path(
    post,
    path = "/console/challenge",
    tag = "console",
    request_body = StartChallengeRequest,
    responses(
        (status = 200, description = "Challenge started", body = ConsoleSnapshot),
        (status = 404, description = "Unknown judge"),
        (status = 409, description = "Judge already played or a presentation is open")
    )
)]
pub async fn start_challenge(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<StartChallengeRequest>>,
) -> Result<Json<ConsoleSnapshot>, AppError> {
    let snapshot = console_service::start_challenge(&state, payload.judge_id.trim()).await?;
    Ok(Json(snapshot))
}

/// Mark the operator's pick on one challenge sub-question.
#[utoipa::path(
    post,
    path = "/console/challenge/answer",
    tag = "console",
    request_body = SubAnswerRequest,
    responses(
        (status = 200, description = "Sub-question answered or already answered", body = SubAnswerResponse),
        (status = 409, description = "No challenge open")
    )
)]
pub async fn answer_sub_question(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SubAnswerRequest>>,
) -> Result<Json<SubAnswerResponse>, AppError> {
    let outcome =
        console_service::answer_sub_question(&state, payload.index, &payload.letter).await?;
    Ok(Json(outcome))
}

/// Close the current presentation.
#[utoipa::path(
    post,
    path = "/console/close",
    tag = "console",
    responses(
        (status = 200, description = "Presentation closed", body = ConsoleSnapshot),
        (status = 409, description = "Challenge still running")
    )
)]
pub async fn close(State(state): State<SharedState>) -> Result<Json<ConsoleSnapshot>, AppError> {
    let snapshot = console_service::close(&state).await?;
    Ok(Json(snapshot))
}
