//! Single-question presentation: option marks, answer outcome and reveal.

use thiserror::Error;

use crate::state::{
    options::OptionBoard,
    question::{CellToken, Question, QuestionAnswer, normalize},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresentationError {
    #[error("free-text questions have no options to pick")]
    FreeText,
    #[error("option `{0}` is not offered for this question")]
    UnknownOption(String),
    #[error("the options are locked")]
    Locked,
}

/// Result of the operator's pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub selected: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Question currently on screen.
#[derive(Debug, Clone)]
pub struct QuestionSession {
    token: CellToken,
    question: Question,
    board: Option<OptionBoard>,
    outcome: Option<AnswerOutcome>,
    times_up: bool,
    answer_revealed: bool,
}

impl QuestionSession {
    pub fn new(token: CellToken, question: Question) -> Self {
        let board = match &question.answer {
            QuestionAnswer::MultipleChoice { options, .. } => Some(OptionBoard::new(options)),
            QuestionAnswer::FreeText { .. } => None,
        };
        Self {
            token,
            question,
            board,
            outcome: None,
            times_up: false,
            answer_revealed: false,
        }
    }

    pub fn token(&self) -> CellToken {
        self.token
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn board(&self) -> Option<&OptionBoard> {
        self.board.as_ref()
    }

    pub fn outcome(&self) -> Option<&AnswerOutcome> {
        self.outcome.as_ref()
    }

    /// Whether the time's-up indicator is showing.
    pub fn times_up(&self) -> bool {
        self.times_up
    }

    pub fn answer_revealed(&self) -> bool {
        self.answer_revealed
    }

    /// Lock the options and mark the pick against the correct letter.
    pub fn submit_answer(&mut self, letter: &str) -> Result<AnswerOutcome, PresentationError> {
        let correct = self
            .question
            .correct_letter()
            .ok_or(PresentationError::FreeText)?
            .to_string();
        let board = self.board.as_mut().ok_or(PresentationError::FreeText)?;
        if board.is_locked() {
            return Err(PresentationError::Locked);
        }
        if !board.contains(letter) {
            return Err(PresentationError::UnknownOption(letter.trim().to_string()));
        }

        let is_correct = board.mark_answer(letter, &correct);
        let outcome = AnswerOutcome {
            selected: normalize(letter),
            correct_answer: correct,
            is_correct,
        };
        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Countdown ran out: lock options and show the indicator.
    pub fn expire(&mut self) {
        if let Some(board) = self.board.as_mut() {
            board.lock();
        }
        self.times_up = true;
    }

    /// Hide the indicator and show the correct answer.
    pub fn reveal(&mut self) {
        self.times_up = false;
        self.answer_revealed = true;
        let correct = self.question.correct_letter().map(str::to_string);
        if let (Some(board), Some(correct)) = (self.board.as_mut(), correct) {
            if self.outcome.is_none() {
                board.reveal(&correct);
            } else {
                board.lock();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::state::{options::OptionMark, question::Part};

    fn multiple_choice(correct: &str) -> QuestionSession {
        let question = Question {
            id: "q".into(),
            part: 1,
            text: "Pick one".into(),
            answer: QuestionAnswer::MultipleChoice {
                options: IndexMap::from([
                    ("A".to_string(), "alpha".to_string()),
                    ("B".to_string(), "beta".to_string()),
                    ("C".to_string(), "gamma".to_string()),
                ]),
                correct: correct.into(),
                explanation: None,
            },
            time_budget_secs: 300,
        };
        QuestionSession::new(CellToken::new(Part::One, 1).unwrap(), question)
    }

    #[test]
    fn normalized_pick_matches_correct_letter() {
        let mut session = multiple_choice("B");
        let outcome = session.submit_answer(" b ").unwrap();
        assert!(outcome.is_correct);
        assert_eq!(outcome.selected, "B");

        let err = session.submit_answer("A").unwrap_err();
        assert_eq!(err, PresentationError::Locked);
    }

    #[test]
    fn unknown_option_is_rejected_without_locking() {
        let mut session = multiple_choice("A");
        assert_eq!(
            session.submit_answer("E"),
            Err(PresentationError::UnknownOption("E".into()))
        );
        assert!(session.submit_answer("C").is_ok());
    }

    #[test]
    fn expiry_then_reveal_marks_correct_option() {
        let mut session = multiple_choice("C");
        session.expire();
        assert!(session.times_up());
        assert_eq!(
            session.submit_answer("A"),
            Err(PresentationError::Locked)
        );

        session.reveal();
        assert!(!session.times_up());
        assert!(session.answer_revealed());
        let board = session.board().unwrap();
        assert_eq!(board.mark("C"), Some(OptionMark::Correct));
        assert_eq!(board.mark("A"), Some(OptionMark::Disabled));
    }

    #[test]
    fn free_text_questions_cannot_be_answered() {
        let question = Question {
            id: "f".into(),
            part: 2,
            text: "Explain".into(),
            answer: QuestionAnswer::FreeText {
                answer: "Because".into(),
            },
            time_budget_secs: 300,
        };
        let mut session = QuestionSession::new(CellToken::new(Part::Two, 3).unwrap(), question);
        assert_eq!(session.submit_answer("A"), Err(PresentationError::FreeText));
        session.reveal();
        assert!(session.answer_revealed());
    }
}
