//! DTOs for the question bank and the selection grids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::QuestionEntity,
    dto::validation::{QUESTION_LETTERS, validate_answer_options, validate_not_blank},
    state::{
        grid::{CellStatus, GridCell},
        question::{Part, normalize},
    },
};

/// Question added from the operator console.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuestionInput {
    /// Part of the show (1 or 2).
    pub part: u8,
    pub question: String,
    /// Letter to text mapping; omit for free-text questions.
    #[serde(default)]
    pub answer_options: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    /// Free-text answer, or explanation for multiple-choice questions.
    #[serde(default)]
    pub answer: Option<String>,
    /// Time budget in seconds; the configured default applies when omitted.
    #[serde(default)]
    pub time: Option<u32>,
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if Part::try_from(self.part).is_err() {
            let mut err = ValidationError::new("part");
            err.message = Some("Part must be 1 or 2".into());
            errors.add("part", err);
        }
        if let Err(e) = validate_not_blank(&self.question) {
            errors.add("question", e);
        }
        if self.time == Some(0) {
            let mut err = ValidationError::new("time");
            err.message = Some("Time must be at least 1 second".into());
            errors.add("time", err);
        }

        match (&self.answer_options, &self.correct_answer) {
            (Some(options), Some(correct)) if !options.is_empty() => {
                if let Err(e) =
                    validate_answer_options(options, correct, &QUESTION_LETTERS, &["A", "B"])
                {
                    errors.add("answer_options", e);
                }
            }
            _ => {
                if let Err(e) = validate_not_blank(self.answer.as_deref().unwrap_or_default()) {
                    errors.add("answer", e);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl QuestionInput {
    /// Convert into a storable record with `id`, applying `default_time` when unset.
    pub fn into_entity(self, id: String, default_time: u32) -> QuestionEntity {
        let answer_options = self.answer_options.filter(|o| !o.is_empty()).map(|o| {
            o.into_iter()
                .map(|(letter, text)| (normalize(&letter), text.trim().to_string()))
                .collect()
        });
        let correct_answer = answer_options
            .as_ref()
            .and(self.correct_answer.as_deref())
            .map(normalize);

        QuestionEntity {
            id,
            part: self.part,
            question: self.question.trim().to_string(),
            answer_options,
            correct_answer,
            answer: self
                .answer
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
            time: Some(self.time.unwrap_or(default_time)),
        }
    }
}

/// Pipe-separated bulk import, one `part|question|answer[|time]` per line.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct BulkImportRequest {
    #[validate(length(min = 1, message = "Import text must not be empty"))]
    pub text: String,
}

/// Rewrite every question's time budget.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GlobalTimeRequest {
    #[validate(range(min = 1, message = "Time must be at least 1 second"))]
    pub seconds: u32,
}

/// Replace the bank from CSV; the configured file is read when `csv` is omitted.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CsvImportRequest {
    #[serde(default)]
    pub csv: Option<String>,
}

/// Outcome of an import.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImportSummary {
    pub imported: usize,
    /// Lines that could not be parsed (bulk text only).
    pub skipped: usize,
    pub total: usize,
}

/// Size of the bank.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct QuestionStats {
    pub total: usize,
    pub part_one: usize,
    pub part_two: usize,
    /// Grid cells already consumed.
    pub used: usize,
}

/// Question as listed for the operator.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionSummary {
    pub id: String,
    pub part: u8,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_options: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub time: Option<u32>,
}

impl From<QuestionEntity> for QuestionSummary {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            part: value.part,
            question: value.question,
            answer_options: value.answer_options.map(|o| o.into_iter().collect()),
            correct_answer: value.correct_answer,
            answer: value.answer,
            time: value.time,
        }
    }
}

/// Display status of a grid cell.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Available,
    Used,
    /// No question backs this cell.
    Unavailable,
}

impl From<CellStatus> for CellState {
    fn from(value: CellStatus) -> Self {
        match value {
            CellStatus::Available => CellState::Available,
            CellStatus::Used => CellState::Used,
            CellStatus::Unavailable => CellState::Unavailable,
        }
    }
}

/// One cell of a grid.
#[derive(Debug, Serialize, ToSchema)]
pub struct GridCellView {
    pub index: u16,
    /// Canonical token (`part1_3`).
    pub token: String,
    pub status: CellState,
}

impl From<GridCell> for GridCellView {
    fn from(value: GridCell) -> Self {
        Self {
            index: value.token.index(),
            token: value.token.to_string(),
            status: value.status.into(),
        }
    }
}

/// Full grid of one part.
#[derive(Debug, Serialize, ToSchema)]
pub struct GridResponse {
    pub part: u8,
    pub questions: usize,
    pub cells: Vec<GridCellView>,
}
