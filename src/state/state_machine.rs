use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// High-level phases the operator console can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsolePhase {
    /// Nothing is presented; grids and judge list are selectable.
    Idle,
    /// A single question is on screen.
    Question(QuestionStage),
    /// A judge challenge is on screen.
    Challenge(ChallengeStage),
}

/// Presentation stage of a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStage {
    /// Options selectable, countdown running.
    Shown,
    /// The operator picked an option.
    Answered {
        /// Whether the pick was the correct letter.
        correct: bool,
    },
    /// Countdown ran out; the time's-up indicator is showing.
    Expired,
    /// Correct answer displayed.
    Revealed,
}

/// Stage of the final judge challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStage {
    /// Sub-questions answerable, aggregate countdown running, closing disabled.
    Active,
    /// Every sub-question answered in time.
    AllAnswered,
    /// Aggregate countdown ran out; the time's-up overlay is showing.
    TimedOut,
    /// Unanswered sub-questions revealed after a timeout.
    Revealed,
}

impl ConsolePhase {
    /// Whether the operator may close the current presentation.
    pub fn can_close(self) -> bool {
        !matches!(self, ConsolePhase::Challenge(ChallengeStage::Active))
    }
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// A grid cell was picked and its question opened.
    QuestionSelected,
    /// The operator picked an option of the open question.
    AnswerSubmitted {
        /// Whether the pick was correct.
        correct: bool,
    },
    /// The question countdown reached zero.
    QuestionTimerExpired,
    /// The correct answer of the open question is shown.
    AnswerRevealed,
    /// A judge was picked and their challenge opened.
    JudgeSelected,
    /// One challenge sub-question was answered, others remain.
    SubQuestionAnswered,
    /// The last challenge sub-question was answered.
    AllSubQuestionsAnswered,
    /// The aggregate challenge countdown reached zero.
    ChallengeTimerExpired,
    /// The time's-up overlay finished and answers are revealed.
    ChallengeRevealed,
    /// The operator closed the presentation.
    ModalClosed,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: ConsolePhase,
    /// The event that cannot be applied from this phase.
    pub event: ConsoleEvent,
}

/// Errors that can occur when planning a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// State machine phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when plan was created.
        expected: ConsolePhase,
        /// Current phase.
        actual: ConsolePhase,
    },
    /// State machine version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A planned state machine transition that has been validated but not yet applied.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the state machine is currently in.
    pub from: ConsolePhase,
    /// Phase the state machine will transition to.
    pub to: ConsolePhase,
    /// Event that triggered this transition.
    pub event: ConsoleEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: ConsolePhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
    /// Pending transition phase, if a transition is planned but not yet applied.
    pub pending: Option<ConsolePhase>,
}

/// State machine driving the question and challenge presentation flow.
#[derive(Debug, Clone)]
pub struct ConsoleStateMachine {
    phase: ConsolePhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for ConsoleStateMachine {
    fn default() -> Self {
        Self {
            phase: ConsolePhase::Idle,
            version: 0,
            pending: None,
        }
    }
}

impl ConsoleStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> ConsolePhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Plan a transition by validating that the event can be applied from the current phase.
    /// Returns a Plan that can later be applied or aborted.
    pub fn plan(&mut self, event: ConsoleEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the state machine to the next phase.
    /// Returns the new phase after the transition.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<ConsolePhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;
        self.pending = None;

        Ok(self.phase)
    }

    /// Abort a planned transition without applying it, returning the state machine to its previous state.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Plan and immediately apply a transition that needs no side work.
    pub fn fire(&mut self, event: ConsoleEvent) -> Result<ConsolePhase, PlanError> {
        let plan = self.plan(event)?;
        // A freshly created plan always matches the current phase and version.
        self.apply(plan.id).map_err(|_| PlanError::AlreadyPending)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: ConsoleEvent) -> Result<ConsolePhase, InvalidTransition> {
        use ChallengeStage as C;
        use ConsoleEvent as E;
        use ConsolePhase as P;
        use QuestionStage as Q;

        let next = match (self.phase, event) {
            (P::Idle, E::QuestionSelected) => P::Question(Q::Shown),
            (P::Question(Q::Shown), E::AnswerSubmitted { correct }) => {
                P::Question(Q::Answered { correct })
            }
            (P::Question(Q::Shown), E::QuestionTimerExpired) => P::Question(Q::Expired),
            (P::Question(Q::Shown | Q::Answered { .. } | Q::Expired), E::AnswerRevealed) => {
                P::Question(Q::Revealed)
            }
            (P::Question(_), E::ModalClosed) => P::Idle,
            (P::Idle, E::JudgeSelected) => P::Challenge(C::Active),
            (P::Challenge(C::Active), E::SubQuestionAnswered) => P::Challenge(C::Active),
            (P::Challenge(C::Active), E::AllSubQuestionsAnswered) => P::Challenge(C::AllAnswered),
            (P::Challenge(C::Active), E::ChallengeTimerExpired) => P::Challenge(C::TimedOut),
            (P::Challenge(C::TimedOut), E::ChallengeRevealed) => P::Challenge(C::Revealed),
            (P::Challenge(C::AllAnswered | C::TimedOut | C::Revealed), E::ModalClosed) => P::Idle,
            (P::Idle, E::ModalClosed) => P::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut ConsoleStateMachine, event: ConsoleEvent) -> ConsolePhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    #[test]
    fn initial_state_is_idle() {
        let sm = ConsoleStateMachine::new();
        assert_eq!(sm.phase(), ConsolePhase::Idle);
    }

    #[test]
    fn question_answered_then_closed() {
        let mut sm = ConsoleStateMachine::new();

        assert_eq!(
            apply(&mut sm, ConsoleEvent::QuestionSelected),
            ConsolePhase::Question(QuestionStage::Shown)
        );
        assert_eq!(
            apply(&mut sm, ConsoleEvent::AnswerSubmitted { correct: false }),
            ConsolePhase::Question(QuestionStage::Answered { correct: false })
        );
        assert_eq!(
            apply(&mut sm, ConsoleEvent::AnswerRevealed),
            ConsolePhase::Question(QuestionStage::Revealed)
        );
        assert_eq!(apply(&mut sm, ConsoleEvent::ModalClosed), ConsolePhase::Idle);
        assert_eq!(sm.snapshot().version, 4);
    }

    #[test]
    fn expired_question_cannot_be_answered() {
        let mut sm = ConsoleStateMachine::new();
        apply(&mut sm, ConsoleEvent::QuestionSelected);
        apply(&mut sm, ConsoleEvent::QuestionTimerExpired);

        let err = sm
            .plan(ConsoleEvent::AnswerSubmitted { correct: true })
            .unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, ConsolePhase::Question(QuestionStage::Expired));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn challenge_timeout_path() {
        let mut sm = ConsoleStateMachine::new();
        apply(&mut sm, ConsoleEvent::JudgeSelected);
        assert!(!sm.phase().can_close());

        assert_eq!(
            apply(&mut sm, ConsoleEvent::SubQuestionAnswered),
            ConsolePhase::Challenge(ChallengeStage::Active)
        );
        assert_eq!(
            apply(&mut sm, ConsoleEvent::ChallengeTimerExpired),
            ConsolePhase::Challenge(ChallengeStage::TimedOut)
        );
        assert!(sm.phase().can_close());
        assert_eq!(
            apply(&mut sm, ConsoleEvent::ChallengeRevealed),
            ConsolePhase::Challenge(ChallengeStage::Revealed)
        );
        assert_eq!(apply(&mut sm, ConsoleEvent::ModalClosed), ConsolePhase::Idle);
    }

    #[test]
    fn active_challenge_rejects_close() {
        let mut sm = ConsoleStateMachine::new();
        apply(&mut sm, ConsoleEvent::JudgeSelected);
        assert!(matches!(
            sm.plan(ConsoleEvent::ModalClosed),
            Err(PlanError::InvalidTransition(_))
        ));

        apply(&mut sm, ConsoleEvent::AllSubQuestionsAnswered);
        assert_eq!(apply(&mut sm, ConsoleEvent::ModalClosed), ConsolePhase::Idle);
    }

    #[test]
    fn cannot_open_two_presentations() {
        let mut sm = ConsoleStateMachine::new();
        apply(&mut sm, ConsoleEvent::QuestionSelected);
        assert!(sm.plan(ConsoleEvent::QuestionSelected).is_err());
        assert!(sm.plan(ConsoleEvent::JudgeSelected).is_err());
    }

    #[test]
    fn pending_plan_blocks_new_plans() {
        let mut sm = ConsoleStateMachine::new();
        let plan = sm.plan(ConsoleEvent::QuestionSelected).unwrap();
        assert_eq!(
            sm.plan(ConsoleEvent::JudgeSelected).unwrap_err(),
            PlanError::AlreadyPending
        );
        assert_eq!(
            sm.snapshot().pending,
            Some(ConsolePhase::Question(QuestionStage::Shown))
        );
        sm.abort(plan.id).unwrap();
        assert_eq!(sm.phase(), ConsolePhase::Idle);
    }

    #[test]
    fn abort_clears_pending() {
        let mut sm = ConsoleStateMachine::new();
        let plan = sm.plan(ConsoleEvent::JudgeSelected).unwrap();
        sm.abort(plan.id).unwrap();
        assert!(sm.pending.is_none());
    }

    #[test]
    fn fire_applies_immediately() {
        let mut sm = ConsoleStateMachine::new();
        assert_eq!(
            sm.fire(ConsoleEvent::QuestionSelected).unwrap(),
            ConsolePhase::Question(QuestionStage::Shown)
        );
        assert!(sm.snapshot().pending.is_none());
    }
}
