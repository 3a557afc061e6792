//! DTOs for operator console commands and the presentation snapshot.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{
        phase::VisibleConsolePhase,
        validation::{validate_not_blank, validate_option_letter},
    },
    state::{
        challenge::{ChallengeBlock, JudgeChallenge},
        console::{Console, TimerStatus},
        options::{OptionBoard, OptionMark},
        presentation::QuestionSession,
        question::QuestionAnswer,
    },
};

/// Pick a grid cell.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SelectQuestionRequest {
    #[validate(range(min = 1, max = 2, message = "Part must be 1 or 2"))]
    pub part: u8,
    /// 1-based cell index.
    #[validate(range(min = 1, message = "Cell index starts at 1"))]
    pub index: u16,
}

/// Operator's pick on the open question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    #[validate(custom(function = "validate_option_letter"))]
    pub letter: String,
}

/// Open the challenge of a judge.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StartChallengeRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub judge_id: String,
}

/// Operator's pick on one challenge sub-question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubAnswerRequest {
    /// 0-based position of the sub-question.
    pub index: usize,
    #[validate(custom(function = "validate_option_letter"))]
    pub letter: String,
}

/// Result of a pick on the open question.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    pub selected: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Result of a pick on a challenge sub-question.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubAnswerResponse {
    pub index: usize,
    /// False when the sub-question had already been answered; nothing changed.
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    pub all_answered: bool,
}

/// Visual state of one answer option.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OptionMarkView {
    Neutral,
    Correct,
    Incorrect,
    Disabled,
}

impl From<OptionMark> for OptionMarkView {
    fn from(value: OptionMark) -> Self {
        match value {
            OptionMark::Neutral => OptionMarkView::Neutral,
            OptionMark::Correct => OptionMarkView::Correct,
            OptionMark::Incorrect => OptionMarkView::Incorrect,
            OptionMark::Disabled => OptionMarkView::Disabled,
        }
    }
}

/// One answer option as displayed.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct OptionView {
    pub letter: String,
    pub text: String,
    pub mark: OptionMarkView,
}

fn option_views(board: &OptionBoard) -> Vec<OptionView> {
    board
        .entries()
        .map(|(letter, text, mark)| OptionView {
            letter: letter.to_string(),
            text: text.to_string(),
            mark: mark.into(),
        })
        .collect()
}

/// Countdown as displayed.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct TimerView {
    pub remaining: u32,
    /// `m:ss` for single questions, raw seconds for challenges.
    pub display: String,
    pub warning: bool,
}

impl From<TimerStatus> for TimerView {
    fn from(value: TimerStatus) -> Self {
        Self {
            remaining: value.remaining,
            display: value.rendered(),
            warning: value.warning,
        }
    }
}

/// Single question on screen.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct QuestionView {
    /// Canonical cell token (`part2_7`).
    pub token: String,
    pub part: u8,
    pub index: u16,
    pub text: String,
    /// Empty for free-text questions.
    pub options: Vec<OptionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    pub times_up: bool,
    pub answer_revealed: bool,
    /// Answer text, present once revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl From<&QuestionSession> for QuestionView {
    fn from(session: &QuestionSession) -> Self {
        let token = session.token();
        let question = session.question();
        let answer = session.answer_revealed().then(|| match &question.answer {
            QuestionAnswer::MultipleChoice {
                explanation: Some(explanation),
                ..
            } if !explanation.trim().is_empty() => {
                format!("{}\n{explanation}", question.answer_text())
            }
            _ => question.answer_text(),
        });

        Self {
            token: token.to_string(),
            part: token.part().number(),
            index: token.index(),
            text: question.text.clone(),
            options: session.board().map(option_views).unwrap_or_default(),
            selected: session.outcome().map(|o| o.selected.clone()),
            is_correct: session.outcome().map(|o| o.is_correct),
            times_up: session.times_up(),
            answer_revealed: session.answer_revealed(),
            answer,
        }
    }
}

/// One sub-question block of a challenge.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ChallengeBlockView {
    pub index: usize,
    pub question: String,
    pub options: Vec<OptionView>,
    pub answered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    pub revealed: bool,
}

impl ChallengeBlockView {
    fn new(index: usize, block: &ChallengeBlock) -> Self {
        Self {
            index,
            question: block.question.question.clone(),
            options: option_views(&block.board),
            answered: block.answered,
            selected: block.selected.clone(),
            revealed: block.revealed,
        }
    }
}

/// Judge challenge on screen.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ChallengeView {
    pub judge_id: String,
    pub judge_name: String,
    /// Aggregate budget in seconds.
    pub budget: u32,
    pub answered: usize,
    pub times_up: bool,
    pub blocks: Vec<ChallengeBlockView>,
}

impl From<&JudgeChallenge> for ChallengeView {
    fn from(challenge: &JudgeChallenge) -> Self {
        Self {
            judge_id: challenge.judge_id().to_string(),
            judge_name: challenge.judge_name().to_string(),
            budget: challenge.budget_secs(),
            answered: challenge.answered_count(),
            times_up: challenge.times_up(),
            blocks: challenge
                .blocks()
                .iter()
                .enumerate()
                .map(|(index, block)| ChallengeBlockView::new(index, block))
                .collect(),
        }
    }
}

/// Everything the display needs to render the console.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ConsoleSnapshot {
    pub phase: VisibleConsolePhase,
    /// Whether the operator may close the presentation.
    pub can_close: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerView>,
    /// Audible warning cue currently playing.
    pub cue_playing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<ChallengeView>,
}

impl From<&Console> for ConsoleSnapshot {
    fn from(console: &Console) -> Self {
        let phase = console.phase();
        Self {
            phase: phase.into(),
            can_close: phase.can_close(),
            timer: console.timer_status().map(TimerView::from),
            cue_playing: console.cue_playing(),
            question: console.question().map(QuestionView::from),
            challenge: console.challenge().map(ChallengeView::from),
        }
    }
}
