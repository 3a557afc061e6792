use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{console::ConsoleSnapshot, judge::JudgeSummary, team::TeamSummary};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the display SSE channel.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from raw text.
    pub fn new<E>(event: E, data: String) -> Self
    where
        E: Into<Option<String>>,
    {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to a display when it connects.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
    /// Current console state, so a late display catches up.
    pub console: ConsoleSnapshot,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the console phase or the presentation changes.
pub struct PhaseChangedEvent(pub ConsoleSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast every second while a countdown runs.
pub struct TimerTickEvent {
    pub remaining: u32,
    pub display: String,
    pub warning: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the audible warning cue starts or stops.
pub struct TimerCueEvent {
    pub playing: bool,
}

/// Presentation the time's-up overlay belongs to.
#[derive(Debug, Serialize, ToSchema, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum TimesUpScope {
    Question,
    Challenge,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the time's-up overlay appears or goes away.
pub struct TimesUpEvent {
    pub scope: TimesUpScope,
    pub visible: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a grid cell is consumed or a grid is reset.
pub struct GridUpdatedEvent {
    /// Part whose grid changed; absent when both grids changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<u8>,
    /// Consumed cell token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the judge selection list changes.
pub struct JudgesUpdatedEvent {
    pub available: Vec<JudgeSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a team is picked at random for display.
pub struct TeamPickedEvent {
    pub team: TeamSummary,
}
