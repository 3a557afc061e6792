//! DTOs for the judge panel and their challenge questions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{ChallengeQuestionEntity, JudgeEntity, JudgeKindEntity},
    dto::validation::{CHALLENGE_LETTERS, validate_answer_options, validate_not_blank},
    state::question::normalize,
};

/// Fewest challenge questions a judge may carry.
pub const MIN_CHALLENGE_QUESTIONS: usize = 2;
/// Shortest accepted sub-question budget, in seconds.
pub const MIN_SUB_QUESTION_SECS: u32 = 10;
/// Longest accepted sub-question budget (one hour).
pub const MAX_SUB_QUESTION_SECS: u32 = 3_600;

/// Judge role on the panel.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum JudgeKind {
    #[default]
    Main,
    Secondary,
}

impl From<JudgeKind> for JudgeKindEntity {
    fn from(value: JudgeKind) -> Self {
        match value {
            JudgeKind::Main => JudgeKindEntity::Main,
            JudgeKind::Secondary => JudgeKindEntity::Secondary,
        }
    }
}

impl From<JudgeKindEntity> for JudgeKind {
    fn from(value: JudgeKindEntity) -> Self {
        match value {
            JudgeKindEntity::Main => JudgeKind::Main,
            JudgeKindEntity::Secondary => JudgeKind::Secondary,
        }
    }
}

/// Judge definition used for both creation and update.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JudgeInput {
    pub name: String,
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: JudgeKind,
    /// Opaque portrait reference. Required on creation; omitted on update keeps the current one.
    #[serde(default)]
    pub image_ref: Option<String>,
    pub extra_questions: Vec<ChallengeQuestionInput>,
}

impl Validate for JudgeInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_not_blank(&self.name) {
            errors.add("name", e);
        }
        if let Err(e) = validate_not_blank(&self.title) {
            errors.add("title", e);
        }
        if self.extra_questions.len() < MIN_CHALLENGE_QUESTIONS {
            let mut err = ValidationError::new("extra_questions_count");
            err.message = Some(
                format!("A judge needs at least {MIN_CHALLENGE_QUESTIONS} challenge questions")
                    .into(),
            );
            errors.add("extra_questions", err);
        }

        for (index, question) in self.extra_questions.iter().enumerate() {
            if let Err(question_errors) = question.validate() {
                let mut err = ValidationError::new("extra_question");
                err.message = Some(
                    format!("Challenge question {} is invalid: {question_errors}", index + 1)
                        .into(),
                );
                errors.add("extra_questions", err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// One challenge sub-question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChallengeQuestionInput {
    pub question: String,
    /// Options A to D; A and B are mandatory.
    pub answer_options: BTreeMap<String, String>,
    pub correct_answer: String,
    /// Budget in seconds; the configured default applies when omitted.
    #[serde(default)]
    pub time: Option<u32>,
}

impl Validate for ChallengeQuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_not_blank(&self.question) {
            errors.add("question", e);
        }
        if let Err(e) = validate_answer_options(
            &self.answer_options,
            &self.correct_answer,
            &CHALLENGE_LETTERS,
            &["A", "B"],
        ) {
            errors.add("answer_options", e);
        }
        if self.time.is_some_and(|time| time < MIN_SUB_QUESTION_SECS) {
            let mut err = ValidationError::new("time");
            err.message =
                Some(format!("Time must be at least {MIN_SUB_QUESTION_SECS} seconds").into());
            errors.add("time", err);
        } else if self.time.is_some_and(|time| time > MAX_SUB_QUESTION_SECS) {
            let mut err = ValidationError::new("time");
            err.message =
                Some(format!("Time must be at most {MAX_SUB_QUESTION_SECS} seconds").into());
            errors.add("time", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ChallengeQuestionInput {
    /// Convert into a storable record, applying `default_time` when unset.
    pub fn into_entity(self, default_time: u32) -> ChallengeQuestionEntity {
        ChallengeQuestionEntity {
            question: self.question.trim().to_string(),
            answer_options: self
                .answer_options
                .into_iter()
                .map(|(letter, text)| (normalize(&letter), text.trim().to_string()))
                .filter(|(_, text)| !text.is_empty())
                .collect(),
            correct_answer: normalize(&self.correct_answer),
            time: Some(self.time.unwrap_or(default_time)),
        }
    }
}

/// Challenge sub-question as listed for the operator.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChallengeQuestionSummary {
    pub question: String,
    pub answer_options: BTreeMap<String, String>,
    pub correct_answer: String,
    pub time: Option<u32>,
}

impl From<ChallengeQuestionEntity> for ChallengeQuestionSummary {
    fn from(value: ChallengeQuestionEntity) -> Self {
        Self {
            question: value.question,
            answer_options: value.answer_options.into_iter().collect(),
            correct_answer: value.correct_answer,
            time: value.time,
        }
    }
}

/// Judge as listed for the operator.
#[derive(Debug, Serialize, ToSchema)]
pub struct JudgeSummary {
    pub id: String,
    pub name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: JudgeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub extra_questions: Vec<ChallengeQuestionSummary>,
    /// Whether this judge's challenge has already been played.
    pub used: bool,
}

impl JudgeSummary {
    pub fn from_entity(judge: JudgeEntity, used: bool) -> Self {
        Self {
            id: judge.id,
            name: judge.name,
            title: judge.title,
            kind: judge.kind.into(),
            image_ref: judge.image_ref,
            extra_questions: judge
                .extra_questions
                .into_iter()
                .map(ChallengeQuestionSummary::from)
                .collect(),
            used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub_question(correct: &str, time: Option<u32>) -> ChallengeQuestionInput {
        ChallengeQuestionInput {
            question: "Which river?".into(),
            answer_options: BTreeMap::from([
                ("A".to_string(), "Mekong".to_string()),
                ("B".to_string(), "Red".to_string()),
                ("C".to_string(), String::new()),
            ]),
            correct_answer: correct.into(),
            time,
        }
    }

    fn judge(questions: Vec<ChallengeQuestionInput>) -> JudgeInput {
        JudgeInput {
            name: "Lan".into(),
            title: "Historian".into(),
            kind: JudgeKind::Main,
            image_ref: Some("judges/lan.png".into()),
            extra_questions: questions,
        }
    }

    #[test]
    fn valid_judge_passes() {
        let input = judge(vec![sub_question("a", None), sub_question("B", Some(45))]);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn single_question_is_rejected() {
        let input = judge(vec![sub_question("A", None)]);
        let errors = input.validate().unwrap_err();
        assert!(errors.errors().contains_key("extra_questions"));
    }

    #[test]
    fn short_budget_is_rejected() {
        assert!(sub_question("A", Some(9)).validate().is_err());
        assert!(sub_question("A", Some(10)).validate().is_ok());
    }

    #[test]
    fn oversized_budget_is_rejected() {
        assert!(sub_question("A", Some(MAX_SUB_QUESTION_SECS)).validate().is_ok());
        let errors = sub_question("A", Some(3_000_000_000)).validate().unwrap_err();
        assert!(errors.errors().contains_key("time"));
    }

    #[test]
    fn correct_letter_on_blank_option_is_rejected() {
        let input = judge(vec![sub_question("A", None), sub_question("C", None)]);
        assert!(input.validate().is_err());
    }

    #[test]
    fn entity_conversion_drops_blank_options_and_applies_default_time() {
        let entity = sub_question(" b", None).into_entity(60);
        assert_eq!(entity.correct_answer, "B");
        assert_eq!(entity.time, Some(60));
        assert_eq!(entity.answer_options.len(), 2);
    }
}
