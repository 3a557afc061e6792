use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::{ChallengeStage, ConsolePhase, QuestionStage};

/// Console phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleConsolePhase {
    /// Nothing on screen.
    Idle,
    /// Question shown, options selectable.
    QuestionShown,
    /// Operator picked an option.
    QuestionAnswered,
    /// Countdown ran out, time's-up indicator showing.
    QuestionExpired,
    /// Correct answer displayed.
    QuestionRevealed,
    /// Judge challenge running; closing disabled.
    ChallengeActive,
    /// Every sub-question answered in time.
    ChallengeAllAnswered,
    /// Aggregate countdown ran out, overlay showing.
    ChallengeTimedOut,
    /// Unanswered sub-questions revealed.
    ChallengeRevealed,
}

impl From<ConsolePhase> for VisibleConsolePhase {
    fn from(value: ConsolePhase) -> Self {
        match value {
            ConsolePhase::Idle => VisibleConsolePhase::Idle,
            ConsolePhase::Question(QuestionStage::Shown) => VisibleConsolePhase::QuestionShown,
            ConsolePhase::Question(QuestionStage::Answered { .. }) => {
                VisibleConsolePhase::QuestionAnswered
            }
            ConsolePhase::Question(QuestionStage::Expired) => VisibleConsolePhase::QuestionExpired,
            ConsolePhase::Question(QuestionStage::Revealed) => {
                VisibleConsolePhase::QuestionRevealed
            }
            ConsolePhase::Challenge(ChallengeStage::Active) => VisibleConsolePhase::ChallengeActive,
            ConsolePhase::Challenge(ChallengeStage::AllAnswered) => {
                VisibleConsolePhase::ChallengeAllAnswered
            }
            ConsolePhase::Challenge(ChallengeStage::TimedOut) => {
                VisibleConsolePhase::ChallengeTimedOut
            }
            ConsolePhase::Challenge(ChallengeStage::Revealed) => {
                VisibleConsolePhase::ChallengeRevealed
            }
        }
    }
}
