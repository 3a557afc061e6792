//! One-second countdown used by question and challenge presentations.

use std::{future::Future, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Lifecycle of a [`CountdownTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Expired,
    Cancelled,
}

/// Outcome of a single countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running {
        remaining: u32,
        /// `0 < remaining <= threshold`.
        warning: bool,
        /// Set once, when `remaining == threshold`.
        cue: bool,
    },
    Expired,
}

/// Pure countdown arithmetic, advanced one second per [`Countdown::tick`].
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: u32,
    warning_threshold: u32,
}

impl Countdown {
    pub fn new(duration_secs: u32, warning_threshold: u32) -> Self {
        Self {
            remaining: duration_secs,
            warning_threshold,
        }
    }

    pub fn tick(&mut self) -> Tick {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            return Tick::Expired;
        }
        Tick::Running {
            remaining: self.remaining,
            warning: self.remaining <= self.warning_threshold,
            cue: self.remaining == self.warning_threshold,
        }
    }
}

/// How remaining seconds are rendered on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerDisplay {
    /// `m:ss`, used for single questions.
    Clock,
    /// Raw integer seconds, used for the challenge aggregate.
    Seconds,
}

impl TimerDisplay {
    pub fn render(self, remaining: u32) -> String {
        match self {
            TimerDisplay::Clock => format_clock(remaining),
            TimerDisplay::Seconds => remaining.to_string(),
        }
    }
}

/// Format seconds as `m:ss` (125 becomes `2:05`).
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Receiver of countdown notifications.
pub trait CountdownListener: Send + Sync + 'static {
    /// Called every second with the remaining time, including the final `0`.
    fn on_tick(&self, remaining: u32) -> BoxFuture<'static, ()>;
    /// Called after `on_tick` while the warning threshold is reached.
    fn on_warn(&self, remaining: u32, cue: bool) -> BoxFuture<'static, ()> {
        let _ = (remaining, cue);
        Box::pin(async {})
    }
    fn on_expire(&self) -> BoxFuture<'static, ()>;
}

/// Single active countdown; starting a new one cancels the previous.
#[derive(Debug, Default)]
pub struct CountdownTimer {
    handle: Option<JoinHandle<()>>,
    state: TimerState,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn start(
        &mut self,
        duration_secs: u32,
        warning_threshold: u32,
        listener: Arc<dyn CountdownListener>,
    ) {
        self.cancel();
        let mut countdown = Countdown::new(duration_secs, warning_threshold);
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match countdown.tick() {
                    Tick::Running {
                        remaining,
                        warning,
                        cue,
                    } => {
                        listener.on_tick(remaining).await;
                        if warning {
                            listener.on_warn(remaining, cue).await;
                        }
                    }
                    Tick::Expired => {
                        listener.on_tick(0).await;
                        listener.on_expire().await;
                        break;
                    }
                }
            }
        }));
        self.state = TimerState::Running;
    }

    /// Stop the tick source; no-op unless running.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        if self.state == TimerState::Running {
            self.state = TimerState::Cancelled;
        }
    }

    /// Record expiry from inside the expiry callback without aborting it.
    pub fn mark_expired(&mut self) {
        self.handle.take();
        self.state = TimerState::Expired;
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// One-shot delayed task, used for the time's-up overlay.
#[derive(Debug, Default)]
pub struct DelayedTask {
    handle: Option<JoinHandle<()>>,
}

impl DelayedTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`, replacing any scheduled task.
    pub fn schedule<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Forget the handle from inside the task itself.
    pub fn release(&mut self) {
        self.handle.take();
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
