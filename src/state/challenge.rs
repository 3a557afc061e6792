//! Final-round judge challenge: every sub-question shown at once under one budget.

use thiserror::Error;

use crate::{
    dao::models::{ChallengeQuestionEntity, JudgeEntity},
    state::{options::OptionBoard, question::normalize},
};

/// Budget of a sub-question stored without a time.
pub const DEFAULT_SUB_QUESTION_BUDGET_SECS: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChallengeError {
    #[error("judge `{0}` has no challenge questions")]
    NoSubQuestions(String),
    #[error("challenge question {index} is malformed: {reason}")]
    Malformed { index: usize, reason: &'static str },
    #[error("challenge question {0} does not exist")]
    UnknownSubQuestion(usize),
    #[error("option `{0}` is not offered for this challenge question")]
    UnknownOption(String),
}

/// Sum of sub-question budgets, unset or zero budgets counting as `default_secs`.
///
/// Saturates at `u32::MAX` instead of wrapping.
pub fn aggregate_budget(questions: &[ChallengeQuestionEntity], default_secs: u32) -> u32 {
    questions
        .iter()
        .map(|q| q.time.filter(|t| *t > 0).unwrap_or(default_secs))
        .fold(0u32, u32::saturating_add)
}

/// Marker recorded when a sub-question is answered.
pub fn sub_question_key(judge_id: &str, index: usize) -> String {
    format!("{judge_id}_{index}")
}

/// Result of answering one sub-question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubAnswer {
    /// The block was answered before; nothing changed.
    AlreadyAnswered,
    Answered {
        is_correct: bool,
        all_answered: bool,
    },
}

/// One sub-question on screen with its option board.
#[derive(Debug, Clone)]
pub struct ChallengeBlock {
    /// Stored sub-question.
    pub question: ChallengeQuestionEntity,
    /// Option marks shown for this block.
    pub board: OptionBoard,
    /// True once the operator picked an option.
    pub answered: bool,
    /// Normalized letter picked by the operator.
    pub selected: Option<String>,
    /// True once the correct option has been revealed.
    pub revealed: bool,
}

/// Challenge in progress for one judge.
#[derive(Debug, Clone)]
pub struct JudgeChallenge {
    judge_id: String,
    judge_name: String,
    blocks: Vec<ChallengeBlock>,
    budget_secs: u32,
    times_up: bool,
}

impl JudgeChallenge {
    /// Validate the judge data and prepare every block.
    pub fn start(judge: &JudgeEntity, default_budget_secs: u32) -> Result<Self, ChallengeError> {
        if judge.extra_questions.is_empty() {
            return Err(ChallengeError::NoSubQuestions(judge.id.clone()));
        }

        let mut blocks = Vec::with_capacity(judge.extra_questions.len());
        for (index, question) in judge.extra_questions.iter().enumerate() {
            if question.question.trim().is_empty() {
                return Err(ChallengeError::Malformed {
                    index,
                    reason: "missing question text",
                });
            }
            let board = OptionBoard::new(&question.answer_options);
            if !board.contains(&question.correct_answer) {
                return Err(ChallengeError::Malformed {
                    index,
                    reason: "correct answer is not one of the options",
                });
            }
            blocks.push(ChallengeBlock {
                question: question.clone(),
                board,
                answered: false,
                selected: None,
                revealed: false,
            });
        }

        Ok(Self {
            judge_id: judge.id.clone(),
            judge_name: judge.name.clone(),
            budget_secs: aggregate_budget(&judge.extra_questions, default_budget_secs),
            blocks,
            times_up: false,
        })
    }

    pub fn judge_id(&self) -> &str {
        &self.judge_id
    }

    pub fn judge_name(&self) -> &str {
        &self.judge_name
    }

    pub fn budget_secs(&self) -> u32 {
        self.budget_secs
    }

    pub fn blocks(&self) -> &[ChallengeBlock] {
        &self.blocks
    }

    pub fn times_up(&self) -> bool {
        self.times_up
    }

    pub fn answered_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.answered).count()
    }

    pub fn all_answered(&self) -> bool {
        self.blocks.iter().all(|b| b.answered)
    }

    pub fn question_key(&self, index: usize) -> String {
        sub_question_key(&self.judge_id, index)
    }

    /// Mark the operator's pick on block `index`.
    pub fn answer(&mut self, index: usize, letter: &str) -> Result<SubAnswer, ChallengeError> {
        let block = self
            .blocks
            .get_mut(index)
            .ok_or(ChallengeError::UnknownSubQuestion(index))?;
        if block.answered || block.board.is_locked() {
            return Ok(SubAnswer::AlreadyAnswered);
        }
        if !block.board.contains(letter) {
            return Err(ChallengeError::UnknownOption(letter.trim().to_string()));
        }

        let is_correct = block
            .board
            .mark_answer(letter, &block.question.correct_answer);
        block.answered = true;
        block.selected = Some(normalize(letter));

        Ok(SubAnswer::Answered {
            is_correct,
            all_answered: self.all_answered(),
        })
    }

    /// Timeout: lock every unanswered block and show the indicator.
    pub fn lock_unanswered(&mut self) {
        for block in self.blocks.iter_mut().filter(|b| !b.answered) {
            block.board.lock();
        }
        self.times_up = true;
    }

    /// Reveal the correct option of every unanswered block; returns their indices.
    pub fn reveal_unanswered(&mut self) -> Vec<usize> {
        self.times_up = false;
        let mut revealed = Vec::new();
        for (index, block) in self.blocks.iter_mut().enumerate() {
            if block.answered || block.revealed {
                continue;
            }
            block.board.reveal(&block.question.correct_answer);
            block.revealed = true;
            revealed.push(index);
        }
        revealed
    }
}
