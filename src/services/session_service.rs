//! Operator login, bulk resets, backup and restore.

use std::{collections::BTreeMap, time::SystemTime};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        models::{JudgeEntity, LoginEntity, QuestionEntity, TeamEntity},
        repository::DocumentKey,
    },
    dto::{
        format_system_time,
        session::{ExportResponse, LoginRequest, SessionStatus},
    },
    error::ServiceError,
    services::{judge_service, sse_events},
    state::{
        SharedState,
        question::{UsedChallengeQuestions, UsedCells, UsedJudges},
        state_machine::ConsolePhase,
    },
};

/// Login flag, degraded flag and console phase.
pub async fn status(state: &SharedState) -> SessionStatus {
    let repo = state.documents().await;
    let login = repo.load(DocumentKey::Login, LoginEntity::default()).await;
    let phase = state.console().lock().await.phase();

    SessionStatus {
        logged_in: login.logged_in,
        degraded: state.is_degraded(),
        phase: phase.into(),
    }
}

/// Check the operator credentials against the configuration and persist the login flag.
pub async fn login(state: &SharedState, request: LoginRequest) -> Result<(), ServiceError> {
    let expected = &state.config().operator;
    if request.username != expected.username || request.password != expected.password {
        warn!(username = %request.username, "rejected operator login");
        return Err(ServiceError::Unauthorized(
            "invalid username or password".into(),
        ));
    }

    let repo = state.documents().await;
    repo.save(DocumentKey::Login, &LoginEntity { logged_in: true })
        .await?;
    info!(username = %request.username, "operator logged in");
    Ok(())
}

/// Persist the logged-out flag.
pub async fn logout(state: &SharedState) -> Result<(), ServiceError> {
    let repo = state.documents().await;
    repo.save(DocumentKey::Login, &LoginEntity { logged_in: false })
        .await?;
    info!("operator logged out");
    Ok(())
}

async fn ensure_idle(state: &SharedState) -> Result<(), ServiceError> {
    let phase = state.console().lock().await.phase();
    if phase != ConsolePhase::Idle {
        return Err(ServiceError::InvalidState(
            "close the current presentation first".into(),
        ));
    }
    Ok(())
}

/// Empty every key, then reload the bank from the bulk source.
///
/// The source is read before anything is deleted.
pub async fn reset_all(state: &SharedState) -> Result<usize, ServiceError> {
    ensure_idle(state).await?;
    let questions = state.question_source().fetch().await?;

    let repo = state.documents().await;
    repo.clear_all().await?;
    repo.save(DocumentKey::Questions, &questions).await?;

    info!(questions = questions.len(), "full reset completed");
    sse_events::broadcast_grid_updated(state, None, None);
    judge_service::refresh_judge_list(state).await;
    Ok(questions.len())
}

/// Empty every key.
pub async fn clear_all(state: &SharedState) -> Result<(), ServiceError> {
    ensure_idle(state).await?;
    let repo = state.documents().await;
    repo.clear_all().await?;

    info!("all stored data cleared");
    sse_events::broadcast_grid_updated(state, None, None);
    judge_service::refresh_judge_list(state).await;
    Ok(())
}

/// Decode `value` as the document stored under `key` and encode it back.
fn canonical(key: DocumentKey, value: Value) -> Result<Value, serde_json::Error> {
    fn through<T: Serialize + DeserializeOwned>(value: Value) -> Result<Value, serde_json::Error> {
        serde_json::to_value(serde_json::from_value::<T>(value)?)
    }

    match key {
        DocumentKey::Questions => through::<Vec<QuestionEntity>>(value),
        DocumentKey::UsedQuestions => through::<UsedCells>(value),
        DocumentKey::Judges => through::<Vec<JudgeEntity>>(value),
        DocumentKey::UsedJudges => through::<UsedJudges>(value),
        DocumentKey::UsedFinalQuestions => through::<UsedChallengeQuestions>(value),
        DocumentKey::Teams => through::<Vec<TeamEntity>>(value),
        DocumentKey::Login => through::<LoginEntity>(value),
    }
}

/// Dump every stored document.
///
/// Values that no longer decode are exported as stored.
pub async fn export(state: &SharedState) -> ExportResponse {
    let repo = state.documents().await;
    let mut documents = BTreeMap::new();
    for key in DocumentKey::ALL {
        let Some(value) = repo.load_raw(key).await else {
            continue;
        };
        let value = match canonical(key, value.clone()) {
            Ok(canonical) => canonical,
            Err(err) => {
                warn!(key = %key, error = %err, "exporting undecodable document as stored");
                value
            }
        };
        documents.insert(key.to_string(), value);
    }

    ExportResponse {
        exported_at: format_system_time(SystemTime::now()),
        documents,
    }
}

/// Write every known document of a backup back to the store.
///
/// The whole backup is checked before anything is written; keys absent from
/// the backup keep their stored value.
pub async fn restore(
    state: &SharedState,
    documents: BTreeMap<String, Value>,
) -> Result<usize, ServiceError> {
    ensure_idle(state).await?;

    let mut entries = Vec::with_capacity(documents.len());
    for (name, value) in documents {
        let Some(key) = DocumentKey::from_name(&name) else {
            debug!(key = %name, "skipping unknown backup entry");
            continue;
        };
        let value = canonical(key, value).map_err(|err| {
            ServiceError::InvalidInput(format!("backup entry `{name}` is malformed: {err}"))
        })?;
        entries.push((key, value));
    }

    let repo = state.documents().await;
    for (key, value) in &entries {
        repo.save(*key, value).await?;
    }

    info!(documents = entries.len(), "backup restored");
    sse_events::broadcast_grid_updated(state, None, None);
    judge_service::refresh_judge_list(state).await;
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            document_store::{DocumentStore, MemoryDocumentStore},
            question_source::InlineQuestionSource,
        },
        state::AppState,
    };

    async fn state_with_store() -> (SharedState, MemoryDocumentStore) {
        let store = MemoryDocumentStore::new();
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(InlineQuestionSource::new("question,answer\nQ1,A1\nQ2,A2\n", 1)),
        );
        state.set_document_store(Arc::new(store.clone())).await;
        (state, store)
    }

    fn credentials(password: &str) -> LoginRequest {
        LoginRequest {
            username: "operator".into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn login_checks_configured_credentials() {
        let (state, store) = state_with_store().await;
        let err = login(&state, credentials("wrong")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        assert_eq!(store.peek("login"), None);

        login(&state, credentials("operator")).await.unwrap();
        assert!(status(&state).await.logged_in);

        logout(&state).await.unwrap();
        assert_eq!(store.peek("login"), Some(json!({"logged_in": false})));
    }

    #[tokio::test]
    async fn reset_all_empties_keys_and_reloads_bank() {
        let (state, store) = state_with_store().await;
        store.save("teams", json!([{"team_id": "t", "name": "T"}])).await.unwrap();
        store.save("used_questions", json!(["part1_1"])).await.unwrap();

        assert_eq!(reset_all(&state).await.unwrap(), 2);
        assert_eq!(store.peek("teams"), None);
        assert_eq!(store.peek("used_questions"), None);
        let export = export(&state).await;
        let keys: Vec<_> = export.documents.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["questions"]);
        assert_eq!(export.documents["questions"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn export_lists_canonical_tokens() {
        let (state, store) = state_with_store().await;
        store.save("used_questions", json!([3, "part2_4"])).await.unwrap();
        let export = export(&state).await;
        assert_eq!(export.documents["used_questions"], json!(["part1_3", "part2_4"]));
    }

    #[tokio::test]
    async fn backup_survives_clear_and_restore() {
        let (state, store) = state_with_store().await;
        reset_all(&state).await.unwrap();
        login(&state, credentials("operator")).await.unwrap();
        store.save("teams", json!([{"team_id": "t1", "name": "Owls"}])).await.unwrap();
        store.save("used_questions", json!(["part1_1"])).await.unwrap();
        store.save("used_judges", json!(["j1"])).await.unwrap();
        store.save("used_final_questions", json!(["j1_0", "j1_1"])).await.unwrap();

        let backup = export(&state).await;
        assert_eq!(backup.documents.len(), 6);
        assert_eq!(backup.documents["login"], json!({"logged_in": true}));
        assert_eq!(backup.documents["used_final_questions"], json!(["j1_0", "j1_1"]));
        let before: Vec<_> = DocumentKey::ALL
            .iter()
            .map(|key| store.peek(key.as_str()))
            .collect();

        clear_all(&state).await.unwrap();
        assert!(export(&state).await.documents.is_empty());

        let mut documents = backup.documents.clone();
        documents.insert("exported_at".into(), json!(backup.exported_at));
        assert_eq!(restore(&state, documents).await.unwrap(), 6);

        let after: Vec<_> = DocumentKey::ALL
            .iter()
            .map(|key| store.peek(key.as_str()))
            .collect();
        assert_eq!(after, before);
        assert!(status(&state).await.logged_in);
    }

    #[tokio::test]
    async fn malformed_backup_writes_nothing() {
        let (state, store) = state_with_store().await;
        store.save("teams", json!([{"team_id": "t1", "name": "Owls"}])).await.unwrap();

        let documents = BTreeMap::from([
            ("teams".to_string(), json!([])),
            ("used_questions".to_string(), json!(["part9_1"])),
        ]);
        let err = restore(&state, documents).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(store.peek("teams"), Some(json!([{"team_id": "t1", "name": "Owls"}])));
    }
}
