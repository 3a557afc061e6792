use std::{fmt, hash::Hash, str::FromStr};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dao::models::QuestionEntity;

/// Trim and upper-case an answer letter before comparing it.
pub fn normalize(letter: &str) -> String {
    letter.trim().to_uppercase()
}

/// Show part a grid belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Part {
    One,
    Two,
}

impl Part {
    pub fn number(self) -> u8 {
        match self {
            Part::One => 1,
            Part::Two => 2,
        }
    }
}

impl TryFrom<u8> for Part {
    type Error = CellTokenError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Part::One),
            2 => Ok(Part::Two),
            other => Err(CellTokenError::UnknownPart(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellTokenError {
    #[error("unknown part {0}")]
    UnknownPart(u8),
    #[error("cell index must start at 1")]
    ZeroIndex,
    #[error("malformed cell token `{0}`")]
    Malformed(String),
}

/// Consumed grid cell, rendered `part1_<i>` or `part2_<i>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCellToken", into = "String")]
pub struct CellToken {
    part: Part,
    index: u16,
}

impl CellToken {
    pub fn new(part: Part, index: u16) -> Result<Self, CellTokenError> {
        if index == 0 {
            return Err(CellTokenError::ZeroIndex);
        }
        Ok(Self { part, index })
    }

    pub fn part(self) -> Part {
        self.part
    }

    /// 1-based cell index within the part grid.
    pub fn index(self) -> u16 {
        self.index
    }
}

impl fmt::Display for CellToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "part{}_{}", self.part.number(), self.index)
    }
}

impl From<CellToken> for String {
    fn from(value: CellToken) -> Self {
        value.to_string()
    }
}

impl FromStr for CellToken {
    type Err = CellTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CellTokenError::Malformed(s.to_string());
        let rest = s.strip_prefix("part").ok_or_else(malformed)?;
        let (part, index) = rest.split_once('_').ok_or_else(malformed)?;
        let part = part.parse::<u8>().map_err(|_| malformed())?;
        let index = index.parse::<u16>().map_err(|_| malformed())?;
        CellToken::new(Part::try_from(part)?, index)
    }
}

/// Persisted forms accepted on read: canonical strings and bare part 1 integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCellToken {
    Index(u16),
    Text(String),
}

impl TryFrom<RawCellToken> for CellToken {
    type Error = CellTokenError;

    fn try_from(value: RawCellToken) -> Result<Self, Self::Error> {
        match value {
            RawCellToken::Index(index) => CellToken::new(Part::One, index),
            RawCellToken::Text(text) => match text.parse::<u16>() {
                Ok(index) => CellToken::new(Part::One, index),
                Err(_) => text.parse(),
            },
        }
    }
}

/// Insertion-ordered set of consumed markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageSet<T: Hash + Eq>(IndexSet<T>);

impl<T: Hash + Eq> Default for UsageSet<T> {
    fn default() -> Self {
        Self(IndexSet::new())
    }
}

impl<T: Hash + Eq> UsageSet<T> {
    /// Record `marker`; returns `false` when it was already present.
    pub fn insert(&mut self, marker: T) -> bool {
        self.0.insert(marker)
    }

    pub fn contains(&self, marker: &T) -> bool {
        self.0.contains(marker)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

/// Grid cells already presented.
pub type UsedCells = UsageSet<CellToken>;
/// Judge ids whose challenge has been played.
pub type UsedJudges = UsageSet<String>;
/// `<judgeId>_<index>` keys of answered challenge sub-questions.
pub type UsedChallengeQuestions = UsageSet<String>;

/// How a question is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionAnswer {
    MultipleChoice {
        options: IndexMap<String, String>,
        correct: String,
        explanation: Option<String>,
    },
    FreeText {
        answer: String,
    },
}

/// Question of the bank, as presented on a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: String,
    pub part: u8,
    pub text: String,
    pub answer: QuestionAnswer,
    pub time_budget_secs: u32,
}

impl Question {
    /// Correct letter for multiple-choice questions.
    pub fn correct_letter(&self) -> Option<&str> {
        match &self.answer {
            QuestionAnswer::MultipleChoice { correct, .. } => Some(correct),
            QuestionAnswer::FreeText { .. } => None,
        }
    }

    /// Text shown when the answer is revealed.
    pub fn answer_text(&self) -> String {
        match &self.answer {
            QuestionAnswer::MultipleChoice {
                options, correct, ..
            } => match options.get(correct) {
                Some(text) => format!("{correct}: {text}"),
                None => correct.clone(),
            },
            QuestionAnswer::FreeText { answer } => answer.clone(),
        }
    }
}

impl From<QuestionEntity> for Question {
    fn from(value: QuestionEntity) -> Self {
        let options = value
            .answer_options
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(letter, text)| (normalize(&letter), text))
            .collect::<IndexMap<_, _>>();
        let correct = value.correct_answer.as_deref().map(normalize);

        let answer = match correct {
            Some(correct) if !options.is_empty() && !correct.is_empty() => {
                QuestionAnswer::MultipleChoice {
                    options,
                    correct,
                    explanation: value.answer,
                }
            }
            _ => QuestionAnswer::FreeText {
                answer: value.answer.unwrap_or_default(),
            },
        };

        Self {
            id: value.id,
            part: value.part,
            text: value.question,
            answer,
            time_budget_secs: value.time.unwrap_or(DEFAULT_QUESTION_TIME_SECS),
        }
    }
}

/// Budget applied to stored questions without an explicit time.
pub const DEFAULT_QUESTION_TIME_SECS: u32 = 300;
