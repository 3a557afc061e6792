//! Judge panel management and the final-round usage markers.

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::JudgeEntity,
        repository::{DocumentKey, DocumentRepository},
    },
    dto::judge::{JudgeInput, JudgeSummary},
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        question::{UsedChallengeQuestions, UsedJudges},
    },
};

pub(crate) async fn load_judges(repo: &DocumentRepository) -> Vec<JudgeEntity> {
    repo.load(DocumentKey::Judges, Vec::new()).await
}

pub(crate) async fn load_used_judges(repo: &DocumentRepository) -> UsedJudges {
    repo.load(DocumentKey::UsedJudges, UsedJudges::default())
        .await
}

fn summaries(judges: Vec<JudgeEntity>, used: &UsedJudges) -> Vec<JudgeSummary> {
    judges
        .into_iter()
        .map(|judge| {
            let is_used = used.contains(&judge.id);
            JudgeSummary::from_entity(judge, is_used)
        })
        .collect()
}

fn into_entity(
    id: String,
    input: JudgeInput,
    image_ref: Option<String>,
    default_time: u32,
) -> JudgeEntity {
    JudgeEntity {
        id,
        name: input.name.trim().to_string(),
        title: input.title.trim().to_string(),
        kind: input.kind.into(),
        image_ref,
        extra_questions: input
            .extra_questions
            .into_iter()
            .map(|question| question.into_entity(default_time))
            .collect(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Every judge, flagged with whether their challenge was played.
pub async fn list_judges(state: &SharedState) -> Vec<JudgeSummary> {
    let repo = state.documents().await;
    let used = load_used_judges(&repo).await;
    summaries(load_judges(&repo).await, &used)
}

/// Judges whose challenge has not been played yet.
pub async fn available_judges(state: &SharedState) -> Vec<JudgeSummary> {
    let repo = state.documents().await;
    let used = load_used_judges(&repo).await;
    summaries(load_judges(&repo).await, &used)
        .into_iter()
        .filter(|judge| !judge.used)
        .collect()
}

/// Push the current selectable judges to the display.
pub async fn refresh_judge_list(state: &SharedState) {
    let available = available_judges(state).await;
    sse_events::broadcast_judges_updated(state, available);
}

/// Register a judge; a portrait reference is mandatory.
pub async fn create_judge(
    state: &SharedState,
    input: JudgeInput,
) -> Result<JudgeSummary, ServiceError> {
    let image_ref = non_blank(input.image_ref.clone())
        .ok_or_else(|| ServiceError::InvalidInput("a judge image is required".into()))?;

    let repo = state.documents().await;
    let mut judges = load_judges(&repo).await;
    let judge = into_entity(
        Uuid::new_v4().simple().to_string(),
        input,
        Some(image_ref),
        state.config().new_sub_question_secs,
    );
    judges.push(judge.clone());
    repo.save(DocumentKey::Judges, &judges).await?;

    info!(id = %judge.id, name = %judge.name, "judge created");
    refresh_judge_list(state).await;
    Ok(JudgeSummary::from_entity(judge, false))
}

/// Replace a judge definition, keeping the current portrait when none is supplied.
pub async fn update_judge(
    state: &SharedState,
    id: &str,
    input: JudgeInput,
) -> Result<JudgeSummary, ServiceError> {
    let repo = state.documents().await;
    let mut judges = load_judges(&repo).await;
    let slot = judges
        .iter_mut()
        .find(|judge| judge.id == id)
        .ok_or_else(|| ServiceError::NotFound(format!("judge `{id}` not found")))?;

    let image_ref = non_blank(input.image_ref.clone()).or_else(|| slot.image_ref.clone());
    *slot = into_entity(
        id.to_string(),
        input,
        image_ref,
        state.config().new_sub_question_secs,
    );
    let updated = slot.clone();
    repo.save(DocumentKey::Judges, &judges).await?;

    let used = load_used_judges(&repo).await.contains(&updated.id);
    info!(id = %updated.id, "judge updated");
    refresh_judge_list(state).await;
    Ok(JudgeSummary::from_entity(updated, used))
}

/// Remove a judge.
pub async fn delete_judge(state: &SharedState, id: &str) -> Result<(), ServiceError> {
    let repo = state.documents().await;
    let mut judges = load_judges(&repo).await;
    let before = judges.len();
    judges.retain(|judge| judge.id != id);
    if judges.len() == before {
        return Err(ServiceError::NotFound(format!("judge `{id}` not found")));
    }
    repo.save(DocumentKey::Judges, &judges).await?;

    info!(id, "judge deleted");
    refresh_judge_list(state).await;
    Ok(())
}

/// Forget which judges and challenge sub-questions were played.
pub async fn reset_final_round(state: &SharedState) -> Result<(), ServiceError> {
    let repo = state.documents().await;
    repo.save(DocumentKey::UsedJudges, &UsedJudges::default())
        .await?;
    repo.save(
        DocumentKey::UsedFinalQuestions,
        &UsedChallengeQuestions::default(),
    )
    .await?;

    info!("final round reset");
    refresh_judge_list(state).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, sync::Arc};

    use serde_json::json;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            document_store::{DocumentStore, MemoryDocumentStore},
            question_source::InlineQuestionSource,
        },
        dto::judge::{ChallengeQuestionInput, JudgeKind},
        state::AppState,
    };

    async fn state_with_store() -> (SharedState, MemoryDocumentStore) {
        let store = MemoryDocumentStore::new();
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(InlineQuestionSource::new("", 58)),
        );
        state.set_document_store(Arc::new(store.clone())).await;
        (state, store)
    }

    fn input(image_ref: Option<&str>) -> JudgeInput {
        let sub_question = |time| ChallengeQuestionInput {
            question: "Which year?".into(),
            answer_options: BTreeMap::from([
                ("A".to_string(), "1945".to_string()),
                ("B".to_string(), "1975".to_string()),
            ]),
            correct_answer: "b".into(),
            time,
        };
        JudgeInput {
            name: "Minh".into(),
            title: "Professor".into(),
            kind: JudgeKind::Secondary,
            image_ref: image_ref.map(str::to_string),
            extra_questions: vec![sub_question(None), sub_question(Some(90))],
        }
    }

    #[tokio::test]
    async fn creation_requires_image_and_defaults_time() {
        let (state, _store) = state_with_store().await;
        let err = create_judge(&state, input(None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let judge = create_judge(&state, input(Some("judges/minh.png")))
            .await
            .unwrap();
        assert_eq!(judge.extra_questions[0].time, Some(60));
        assert_eq!(judge.extra_questions[1].time, Some(90));
        assert_eq!(judge.extra_questions[0].correct_answer, "B");
    }

    #[tokio::test]
    async fn update_keeps_image_when_omitted() {
        let (state, _store) = state_with_store().await;
        let judge = create_judge(&state, input(Some("judges/minh.png")))
            .await
            .unwrap();

        let mut changed = input(None);
        changed.title = "Dean".into();
        let updated = update_judge(&state, &judge.id, changed).await.unwrap();
        assert_eq!(updated.title, "Dean");
        assert_eq!(updated.image_ref.as_deref(), Some("judges/minh.png"));

        let missing = update_judge(&state, "nope", input(None)).await.unwrap_err();
        assert!(matches!(missing, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn used_judges_are_not_available_until_reset() {
        let (state, store) = state_with_store().await;
        let judge = create_judge(&state, input(Some("a.png"))).await.unwrap();
        store
            .save("used_judges", json!([judge.id.clone()]))
            .await
            .unwrap();
        store
            .save("used_final_questions", json!([format!("{}_0", judge.id)]))
            .await
            .unwrap();

        assert!(available_judges(&state).await.is_empty());
        assert!(list_judges(&state).await[0].used);

        reset_final_round(&state).await.unwrap();
        assert_eq!(available_judges(&state).await.len(), 1);
        assert_eq!(store.peek("used_final_questions"), Some(json!([])));
    }

    #[tokio::test]
    async fn delete_unknown_judge_is_not_found() {
        let (state, _store) = state_with_store().await;
        assert!(matches!(
            delete_judge(&state, "ghost").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
