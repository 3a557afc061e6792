use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Question record as stored under the `questions` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Identifier (`csv_<n>` for bulk imports, random otherwise).
    #[serde(default)]
    pub id: String,
    /// Part of the show the question belongs to (1 or 2; anything else is kept as is).
    pub part: u8,
    /// Question text.
    pub question: String,
    /// Letter to text mapping for multiple-choice questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_options: Option<IndexMap<String, String>>,
    /// Correct letter for multiple-choice questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Free-text answer or explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Time budget in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u32>,
}

/// Judge role on the panel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum JudgeKindEntity {
    #[default]
    Main,
    Secondary,
}

/// Judge record as stored under the `judges` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JudgeEntity {
    pub id: String,
    pub name: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: JudgeKindEntity,
    /// Opaque reference to the judge portrait.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Challenge sub-questions, in presentation order.
    #[serde(default)]
    pub extra_questions: Vec<ChallengeQuestionEntity>,
}

/// One sub-question of a judge challenge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChallengeQuestionEntity {
    pub question: String,
    #[serde(default)]
    pub answer_options: IndexMap<String, String>,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u32>,
}

/// Team record as stored under the `teams` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    pub team_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

/// Operator login flag stored under the `login` key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LoginEntity {
    pub logged_in: bool,
}
