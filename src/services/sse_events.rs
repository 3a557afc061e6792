use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        console::ConsoleSnapshot,
        judge::JudgeSummary,
        sse::{
            GridUpdatedEvent, JudgesUpdatedEvent, PhaseChangedEvent, ServerEvent, SystemStatus,
            TeamPickedEvent, TimerCueEvent, TimerTickEvent, TimesUpEvent, TimesUpScope,
        },
        team::TeamSummary,
    },
    state::{SharedState, console::Console},
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_TIMER_TICK: &str = "timer.tick";
const EVENT_TIMER_CUE: &str = "timer.cue";
const EVENT_TIMES_UP: &str = "times_up";
const EVENT_GRID_UPDATED: &str = "grid.updated";
const EVENT_JUDGES_UPDATED: &str = "judges.updated";
const EVENT_TEAM_PICKED: &str = "team.picked";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the full console snapshot after any presentation change.
pub fn broadcast_phase_changed(state: &SharedState, console: &Console) {
    let payload = PhaseChangedEvent(ConsoleSnapshot::from(console));
    send_display_event(state, EVENT_PHASE_CHANGED, &payload);
}

/// Broadcast the countdown value reported by the last tick.
pub fn broadcast_timer_tick(state: &SharedState, console: &Console) {
    if let Some(status) = console.timer_status() {
        let payload = TimerTickEvent {
            remaining: status.remaining,
            display: status.rendered(),
            warning: status.warning,
        };
        send_display_event(state, EVENT_TIMER_TICK, &payload);
    }
}

/// Broadcast that the warning cue started or stopped.
pub fn broadcast_timer_cue(state: &SharedState, playing: bool) {
    send_display_event(state, EVENT_TIMER_CUE, &TimerCueEvent { playing });
}

/// Broadcast the time's-up overlay visibility.
pub fn broadcast_times_up(state: &SharedState, scope: TimesUpScope, visible: bool) {
    send_display_event(state, EVENT_TIMES_UP, &TimesUpEvent { scope, visible });
}

/// Broadcast that a cell was consumed, or that grids were reset when `token` is `None`.
pub fn broadcast_grid_updated(state: &SharedState, part: Option<u8>, token: Option<String>) {
    send_display_event(state, EVENT_GRID_UPDATED, &GridUpdatedEvent { part, token });
}

/// Broadcast the judges still selectable for a challenge.
pub fn broadcast_judges_updated(state: &SharedState, available: Vec<JudgeSummary>) {
    send_display_event(state, EVENT_JUDGES_UPDATED, &JudgesUpdatedEvent { available });
}

/// Broadcast the team picked at random.
pub fn broadcast_team_picked(state: &SharedState, team: TeamSummary) {
    send_display_event(state, EVENT_TEAM_PICKED, &TeamPickedEvent { team });
}

/// Broadcast a degraded-mode change.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_display_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_display_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.display_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize display SSE payload"),
    }
}
