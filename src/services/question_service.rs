//! Question bank management: grids, additions, imports and the shuffle reset.

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::QuestionEntity,
        question_source::{InlineQuestionSource, QuestionSource},
        repository::{DocumentKey, DocumentRepository},
    },
    dto::question::{
        CsvImportRequest, GridCellView, GridResponse, ImportSummary, QuestionInput,
        QuestionStats, QuestionSummary,
    },
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        grid::{grid_cells, questions_in_part},
        question::{Part, UsedCells},
        shuffle::shuffle_by_part,
    },
};

/// Parse a part number coming from a client.
pub fn parse_part(part: u8) -> Result<Part, ServiceError> {
    Part::try_from(part).map_err(|err| ServiceError::InvalidInput(err.to_string()))
}

pub(crate) async fn load_bank(repo: &DocumentRepository) -> Vec<QuestionEntity> {
    repo.load(DocumentKey::Questions, Vec::new()).await
}

pub(crate) async fn load_used_cells(repo: &DocumentRepository) -> UsedCells {
    repo.load(DocumentKey::UsedQuestions, UsedCells::default())
        .await
}

fn stats_of(bank: &[QuestionEntity], used: &UsedCells) -> QuestionStats {
    QuestionStats {
        total: bank.len(),
        part_one: questions_in_part(bank, Part::One).len(),
        part_two: questions_in_part(bank, Part::Two).len(),
        used: used.len(),
    }
}

/// Every question of the bank, in storage order.
pub async fn list_questions(state: &SharedState) -> Vec<QuestionSummary> {
    let repo = state.documents().await;
    load_bank(&repo)
        .await
        .into_iter()
        .map(QuestionSummary::from)
        .collect()
}

/// Bank size per part and consumed cell count.
pub async fn stats(state: &SharedState) -> QuestionStats {
    let repo = state.documents().await;
    let bank = load_bank(&repo).await;
    let used = load_used_cells(&repo).await;
    stats_of(&bank, &used)
}

/// Every cell of the grid of `part` with its status.
pub async fn grid(state: &SharedState, part: u8) -> Result<GridResponse, ServiceError> {
    let part = parse_part(part)?;
    let repo = state.documents().await;
    let bank = load_bank(&repo).await;
    let used = load_used_cells(&repo).await;

    Ok(GridResponse {
        part: part.number(),
        questions: questions_in_part(&bank, part).len(),
        cells: grid_cells(&bank, &used, part, state.config().cells(part))
            .into_iter()
            .map(GridCellView::from)
            .collect(),
    })
}

/// Append one question to the bank.
pub async fn add_question(
    state: &SharedState,
    input: QuestionInput,
) -> Result<QuestionSummary, ServiceError> {
    let repo = state.documents().await;
    let mut bank = load_bank(&repo).await;

    let entity = input.into_entity(
        Uuid::new_v4().simple().to_string(),
        state.config().default_question_secs,
    );
    bank.push(entity.clone());
    repo.save(DocumentKey::Questions, &bank).await?;

    info!(id = %entity.id, part = entity.part, "question added");
    sse_events::broadcast_grid_updated(state, Some(entity.part), None);
    Ok(entity.into())
}

/// Parse one `part|question|answer[|time]` line.
///
/// Returns `None` for blank or malformed lines. A missing, unparsable or zero
/// time falls back to `default_time`.
pub fn parse_bulk_line(line: &str, default_time: u32) -> Option<QuestionEntity> {
    let fields = line.split('|').map(str::trim).collect::<Vec<_>>();
    if fields.len() < 3 {
        return None;
    }

    let part = fields[0].parse::<u8>().ok().filter(|p| Part::try_from(*p).is_ok())?;
    let question = fields[1];
    let answer = fields[2];
    if question.is_empty() || answer.is_empty() {
        return None;
    }
    let time = fields
        .get(3)
        .and_then(|t| t.parse::<u32>().ok())
        .filter(|t| *t > 0)
        .unwrap_or(default_time);

    Some(QuestionEntity {
        id: Uuid::new_v4().simple().to_string(),
        part,
        question: question.to_string(),
        answer_options: None,
        correct_answer: None,
        answer: Some(answer.to_string()),
        time: Some(time),
    })
}

/// Append every valid line of a pipe-separated import to the bank.
pub async fn bulk_import(state: &SharedState, text: &str) -> Result<ImportSummary, ServiceError> {
    let default_time = state.config().default_question_secs;
    let lines = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>();
    let parsed = lines
        .iter()
        .filter_map(|line| parse_bulk_line(line, default_time))
        .collect::<Vec<_>>();

    if parsed.is_empty() {
        return Err(ServiceError::InvalidInput(
            "no valid `part|question|answer[|time]` line found".into(),
        ));
    }

    let repo = state.documents().await;
    let mut bank = load_bank(&repo).await;
    let imported = parsed.len();
    bank.extend(parsed);
    repo.save(DocumentKey::Questions, &bank).await?;

    let skipped = lines.len() - imported;
    if skipped > 0 {
        warn!(skipped, "bulk import skipped malformed lines");
    }
    info!(imported, total = bank.len(), "bulk import appended questions");
    sse_events::broadcast_grid_updated(state, None, None);

    Ok(ImportSummary {
        imported,
        skipped,
        total: bank.len(),
    })
}

/// Overwrite the time budget of every question; returns how many were updated.
pub async fn apply_global_time(state: &SharedState, seconds: u32) -> Result<usize, ServiceError> {
    if seconds == 0 {
        return Err(ServiceError::InvalidInput(
            "time must be at least 1 second".into(),
        ));
    }

    let repo = state.documents().await;
    let mut bank = load_bank(&repo).await;
    for question in bank.iter_mut() {
        question.time = Some(seconds);
    }
    repo.save(DocumentKey::Questions, &bank).await?;

    info!(seconds, count = bank.len(), "applied global question time");
    Ok(bank.len())
}

/// Replace the bank from uploaded CSV text, or from the configured source.
///
/// Consumed cells are cleared since they refer to the previous bank.
pub async fn import_csv(
    state: &SharedState,
    request: CsvImportRequest,
) -> Result<ImportSummary, ServiceError> {
    let questions = match request.csv {
        Some(text) => {
            InlineQuestionSource::new(text, state.config().part_one_rows)
                .fetch()
                .await?
        }
        None => state.question_source().fetch().await?,
    };
    if questions.is_empty() {
        return Err(ServiceError::InvalidInput(
            "the CSV source holds no questions".into(),
        ));
    }

    let repo = state.documents().await;
    repo.save(DocumentKey::Questions, &questions).await?;
    repo.save(DocumentKey::UsedQuestions, &UsedCells::default())
        .await?;

    info!(count = questions.len(), "question bank replaced from CSV");
    sse_events::broadcast_grid_updated(state, None, None);
    Ok(ImportSummary {
        imported: questions.len(),
        skipped: 0,
        total: questions.len(),
    })
}

/// Reload the bank from the bulk source, shuffle each part and clear consumed cells.
///
/// Judges, teams and login are left untouched.
pub async fn reset_questions_only(state: &SharedState) -> Result<QuestionStats, ServiceError> {
    let fresh = state.question_source().fetch().await?;
    let bank = shuffle_by_part(fresh, &mut rand::rng());

    let repo = state.documents().await;
    repo.save(DocumentKey::Questions, &bank).await?;
    let used = UsedCells::default();
    repo.save(DocumentKey::UsedQuestions, &used).await?;

    let stats = stats_of(&bank, &used);
    info!(
        total = stats.total,
        part_one = stats.part_one,
        part_two = stats.part_two,
        "question bank reshuffled"
    );
    sse_events::broadcast_grid_updated(state, None, None);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, sync::Arc};

    use serde_json::json;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::document_store::{DocumentStore, MemoryDocumentStore},
        dto::question::CellState,
        state::AppState,
    };

    const BANK_CSV: &str = "question,answer\n\
        Capital of France?,Paris\n\
        Largest ocean?,Pacific\n\
        Fastest land animal?,Cheetah\n\
        Boiling point of water?,100 C\n\
        Closest star?,Sun\n";

    async fn state_with_store() -> (SharedState, MemoryDocumentStore) {
        let store = MemoryDocumentStore::new();
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(InlineQuestionSource::new(BANK_CSV, 3)),
        );
        state.set_document_store(Arc::new(store.clone())).await;
        (state, store)
    }

    #[tokio::test]
    async fn reset_keeps_other_keys_byte_identical() {
        let (state, store) = state_with_store().await;
        let judges = json!([{"id": "j1", "name": "Lan", "title": "Dr", "type": "main"}]);
        let teams = json!([{"team_id": "t1", "name": "Blue"}]);
        let login = json!({"logged_in": true});
        store.save("judges", judges.clone()).await.unwrap();
        store.save("teams", teams.clone()).await.unwrap();
        store.save("login", login.clone()).await.unwrap();
        store
            .save("used_questions", json!(["part1_1", "part2_2"]))
            .await
            .unwrap();

        let stats = reset_questions_only(&state).await.unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.part_one, 3);
        assert_eq!(stats.part_two, 2);
        assert_eq!(stats.used, 0);

        assert_eq!(store.peek("judges"), Some(judges));
        assert_eq!(store.peek("teams"), Some(teams));
        assert_eq!(store.peek("login"), Some(login));
        assert_eq!(store.peek("used_questions"), Some(json!([])));

        let bank: Vec<QuestionEntity> =
            serde_json::from_value(store.peek("questions").unwrap()).unwrap();
        let parts = bank.iter().map(|q| q.part).collect::<Vec<_>>();
        assert_eq!(parts, vec![1, 1, 1, 2, 2]);
    }

    #[test]
    fn bulk_lines_are_parsed_with_default_time() {
        let q = parse_bulk_line("2| Who painted it? | Da Vinci ", 300).unwrap();
        assert_eq!(q.part, 2);
        assert_eq!(q.question, "Who painted it?");
        assert_eq!(q.answer.as_deref(), Some("Da Vinci"));
        assert_eq!(q.time, Some(300));

        let timed = parse_bulk_line("1|Q|A|45", 300).unwrap();
        assert_eq!(timed.time, Some(45));

        assert!(parse_bulk_line("3|Q|A", 300).is_none());
        assert!(parse_bulk_line("1|Q", 300).is_none());
        assert!(parse_bulk_line("1||A", 300).is_none());
    }

    #[tokio::test]
    async fn bulk_import_appends_and_counts_skips() {
        let (state, _store) = state_with_store().await;
        let summary = bulk_import(&state, "1|Q1|A1\nnot a line\n2|Q2|A2|30\n")
            .await
            .unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(stats(&state).await.part_two, 1);
    }

    #[tokio::test]
    async fn global_time_rewrites_every_question() {
        let (state, store) = state_with_store().await;
        reset_questions_only(&state).await.unwrap();

        assert_eq!(apply_global_time(&state, 90).await.unwrap(), 5);
        let bank: Vec<QuestionEntity> =
            serde_json::from_value(store.peek("questions").unwrap()).unwrap();
        assert!(bank.iter().all(|q| q.time == Some(90)));
        assert!(apply_global_time(&state, 0).await.is_err());
    }

    #[tokio::test]
    async fn grid_marks_unavailable_cells_beyond_bank() {
        let (state, store) = state_with_store().await;
        reset_questions_only(&state).await.unwrap();
        store.save("used_questions", json!([2])).await.unwrap();

        let part_one = grid(&state, 1).await.unwrap();
        assert_eq!(part_one.cells.len(), 58);
        assert_eq!(part_one.questions, 3);
        assert_eq!(part_one.cells[0].status, CellState::Available);
        assert_eq!(part_one.cells[1].status, CellState::Used);
        assert_eq!(part_one.cells[3].status, CellState::Unavailable);
        assert!(grid(&state, 3).await.is_err());
    }

    #[tokio::test]
    async fn added_question_gets_default_time() {
        let (state, _store) = state_with_store().await;
        let input = QuestionInput {
            part: 1,
            question: "Pick one".into(),
            answer_options: Some(BTreeMap::from([
                ("a".to_string(), "yes".to_string()),
                ("b".to_string(), "no".to_string()),
            ])),
            correct_answer: Some(" b".into()),
            answer: None,
            time: None,
        };
        let added = add_question(&state, input).await.unwrap();
        assert_eq!(added.time, Some(300));
        assert_eq!(added.correct_answer.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn writes_fail_without_store() {
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(InlineQuestionSource::new(BANK_CSV, 3)),
        );
        let err = reset_questions_only(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }
}
