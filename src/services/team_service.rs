use rand::seq::IndexedRandom;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::TeamEntity,
        repository::{DocumentKey, DocumentRepository},
    },
    dto::team::{TeamInput, TeamSummary},
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

async fn load_teams(repo: &DocumentRepository) -> Vec<TeamEntity> {
    repo.load(DocumentKey::Teams, Vec::new()).await
}

/// Every registered team.
pub async fn list_teams(state: &SharedState) -> Vec<TeamSummary> {
    let repo = state.documents().await;
    load_teams(&repo)
        .await
        .into_iter()
        .map(TeamSummary::from)
        .collect()
}

/// Register a team; names are unique ignoring case.
pub async fn create_team(
    state: &SharedState,
    input: TeamInput,
) -> Result<TeamSummary, ServiceError> {
    let name = input.name.trim().to_string();
    let repo = state.documents().await;
    let mut teams = load_teams(&repo).await;

    let lowered = name.to_lowercase();
    if teams.iter().any(|team| team.name.to_lowercase() == lowered) {
        return Err(ServiceError::InvalidInput(format!(
            "a team named `{name}` already exists"
        )));
    }

    let team = TeamEntity {
        team_id: Uuid::new_v4().simple().to_string(),
        name,
        image_ref: input
            .image_ref
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
    };
    teams.push(team.clone());
    repo.save(DocumentKey::Teams, &teams).await?;

    info!(team_id = %team.team_id, name = %team.name, "team created");
    Ok(team.into())
}

/// Remove a team.
pub async fn delete_team(state: &SharedState, team_id: &str) -> Result<(), ServiceError> {
    let repo = state.documents().await;
    let mut teams = load_teams(&repo).await;
    let before = teams.len();
    teams.retain(|team| team.team_id != team_id);
    if teams.len() == before {
        return Err(ServiceError::NotFound(format!("team `{team_id}` not found")));
    }
    repo.save(DocumentKey::Teams, &teams).await?;

    info!(team_id, "team deleted");
    Ok(())
}

/// Pick one team uniformly at random and show it on the display.
pub async fn pick_random_team(state: &SharedState) -> Result<TeamSummary, ServiceError> {
    let repo = state.documents().await;
    let teams = load_teams(&repo).await;
    let team = teams
        .choose(&mut rand::rng())
        .cloned()
        .map(TeamSummary::from)
        .ok_or_else(|| ServiceError::NotEnoughData("no team registered".into()))?;

    sse_events::broadcast_team_picked(state, team.clone());
    Ok(team)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{document_store::MemoryDocumentStore, question_source::InlineQuestionSource},
        state::AppState,
    };

    async fn state_with_store() -> SharedState {
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(InlineQuestionSource::new("", 58)),
        );
        state
            .set_document_store(Arc::new(MemoryDocumentStore::new()))
            .await;
        state
    }

    fn team(name: &str) -> TeamInput {
        TeamInput {
            name: name.into(),
            image_ref: None,
        }
    }

    #[tokio::test]
    async fn names_are_unique_ignoring_case() {
        let state = state_with_store().await;
        create_team(&state, team("Blue Whales")).await.unwrap();
        let err = create_team(&state, team("  blue whales ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(list_teams(&state).await.len(), 1);
    }

    #[tokio::test]
    async fn random_pick_needs_a_team() {
        let state = state_with_store().await;
        assert!(matches!(
            pick_random_team(&state).await,
            Err(ServiceError::NotEnoughData(_))
        ));

        let created = create_team(&state, team("Red")).await.unwrap();
        let picked = pick_random_team(&state).await.unwrap();
        assert_eq!(picked, created);
    }

    #[tokio::test]
    async fn delete_removes_team() {
        let state = state_with_store().await;
        let created = create_team(&state, team("Green")).await.unwrap();
        delete_team(&state, &created.team_id).await.unwrap();
        assert!(list_teams(&state).await.is_empty());
        assert!(delete_team(&state, &created.team_id).await.is_err());
    }
}
