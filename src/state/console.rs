//! In-memory operator console: the phase machine plus whatever is on screen.

use crate::state::{
    challenge::JudgeChallenge,
    countdown::{CountdownTimer, DelayedTask, TimerDisplay},
    presentation::QuestionSession,
    state_machine::{ConsolePhase, ConsoleStateMachine},
};

/// What the display currently shows.
#[derive(Debug, Default)]
pub enum Presentation {
    #[default]
    Empty,
    Question(QuestionSession),
    Challenge(JudgeChallenge),
}

/// Last countdown value reported to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerStatus {
    /// Seconds left on the countdown.
    pub remaining: u32,
    /// Inside the final warning window.
    pub warning: bool,
    /// How the value is rendered on the display.
    pub display: TimerDisplay,
}

impl TimerStatus {
    pub fn rendered(&self) -> String {
        self.display.render(self.remaining)
    }
}

/// Transient console state; never persisted.
#[derive(Debug, Default)]
pub struct Console {
    machine: ConsoleStateMachine,
    presentation: Presentation,
    timer: CountdownTimer,
    overlay: DelayedTask,
    timer_status: Option<TimerStatus>,
    cue_playing: bool,
    session: u64,
    judge_recorded: bool,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ConsolePhase {
        self.machine.phase()
    }

    pub fn machine_mut(&mut self) -> &mut ConsoleStateMachine {
        &mut self.machine
    }

    /// Identifier of the current presentation; timer callbacks carry it to detect staleness.
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn question(&self) -> Option<&QuestionSession> {
        match &self.presentation {
            Presentation::Question(session) => Some(session),
            _ => None,
        }
    }

    pub fn question_mut(&mut self) -> Option<&mut QuestionSession> {
        match &mut self.presentation {
            Presentation::Question(session) => Some(session),
            _ => None,
        }
    }

    pub fn challenge(&self) -> Option<&JudgeChallenge> {
        match &self.presentation {
            Presentation::Challenge(challenge) => Some(challenge),
            _ => None,
        }
    }

    pub fn challenge_mut(&mut self) -> Option<&mut JudgeChallenge> {
        match &mut self.presentation {
            Presentation::Challenge(challenge) => Some(challenge),
            _ => None,
        }
    }

    /// Put a question on screen and return its session id.
    pub fn open_question(
        &mut self,
        session: QuestionSession,
        countdown_secs: u32,
        display: TimerDisplay,
    ) -> u64 {
        self.open(Presentation::Question(session), countdown_secs, display)
    }

    /// Put a challenge on screen and return its session id.
    pub fn open_challenge(&mut self, challenge: JudgeChallenge, display: TimerDisplay) -> u64 {
        let remaining = challenge.budget_secs();
        self.open(Presentation::Challenge(challenge), remaining, display)
    }

    fn open(&mut self, presentation: Presentation, remaining: u32, display: TimerDisplay) -> u64 {
        self.silence();
        self.session += 1;
        self.presentation = presentation;
        self.judge_recorded = false;
        self.timer_status = Some(TimerStatus {
            remaining,
            warning: false,
            display,
        });
        self.session
    }

    pub fn timer_mut(&mut self) -> &mut CountdownTimer {
        &mut self.timer
    }

    pub fn overlay_mut(&mut self) -> &mut DelayedTask {
        &mut self.overlay
    }

    pub fn timer_status(&self) -> Option<TimerStatus> {
        self.timer_status
    }

    pub fn record_tick(&mut self, remaining: u32, warning: bool) {
        if let Some(status) = self.timer_status.as_mut() {
            status.remaining = remaining;
            status.warning = warning;
        }
    }

    pub fn cue_playing(&self) -> bool {
        self.cue_playing
    }

    pub fn set_cue_playing(&mut self, playing: bool) {
        self.cue_playing = playing;
    }

    /// Mark the challenge judge as persisted; returns `false` if it already was.
    pub fn claim_judge_record(&mut self) -> bool {
        !std::mem::replace(&mut self.judge_recorded, true)
    }

    /// Undo [`Console::claim_judge_record`] after a failed write.
    pub fn release_judge_record(&mut self) {
        self.judge_recorded = false;
    }

    /// Cancel the countdown, the overlay and the cue.
    pub fn silence(&mut self) {
        self.timer.cancel();
        self.overlay.cancel();
        self.cue_playing = false;
    }

    /// Drop whatever is on screen.
    pub fn clear(&mut self) {
        self.silence();
        self.presentation = Presentation::Empty;
        self.timer_status = None;
        self.session += 1;
    }
}
