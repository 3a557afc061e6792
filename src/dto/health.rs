use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of presentation displays currently connected.
    pub display_subscribers: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(display_subscribers: usize) -> Self {
        Self {
            status: "ok".to_string(),
            display_subscribers,
        }
    }

    /// Create a health response indicating the system runs without storage.
    pub fn degraded(display_subscribers: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            display_subscribers,
        }
    }
}
