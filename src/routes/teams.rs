use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        session::ActionResponse,
        team::{TeamInput, TeamSummary},
    },
    error::AppError,
    services::team_service,
    state::SharedState,
};

/// Routes handling the team registry.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/teams", get(list_teams).post(create_team))
        .route("/teams/pick", post(pick_team))
        .route("/teams/{id}", delete(delete_team))
}

/// Every registered team.
#[utoipa::path(
    get,
    path = "/teams",
    tag = "teams",
    responses((status = 200, description = "Teams", body = [TeamSummary]))
)]
pub async fn list_teams(State(state): State<SharedState>) -> Json<Vec<TeamSummary>> {
    Json(team_service::list_teams(&state).await)
}

/// Register a team.
#[utoipa::path(
    post,
    path = "/teams",
    tag = "teams",
    request_body = TeamInput,
    responses(
        (status = 200, description = "Team created", body = TeamSummary),
        (status = 400, description = "Blank or duplicate name")
    )
)]
pub async fn create_team(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<TeamInput>>,
) -> Result<Json<TeamSummary>, AppError> {
    let team = team_service::create_team(&state, payload).await?;
    Ok(Json(team))
}

/// Remove a team.
#[utoipa::path(
    delete,
    path = "/teams/{id}",
    tag = "teams",
    params(("id" = String, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Team deleted", body = ActionResponse),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn delete_team(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    team_service::delete_team(&state, &id).await?;
    Ok(Json(ActionResponse::new("team deleted")))
}

/// Pick a random team and show it on the display.
#[utoipa::path(
    post,
    path = "/teams/pick",
    tag = "teams",
    responses(
        (status = 200, description = "Picked team", body = TeamSummary),
        (status = 422, description = "No team registered")
    )
)]
pub async fn pick_team(State(state): State<SharedState>) -> Result<Json<TeamSummary>, AppError> {
    let team = team_service::pick_random_team(&state).await?;
    Ok(Json(team))
}
