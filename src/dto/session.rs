//! DTOs for operator login, bulk resets and data export.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::phase::VisibleConsolePhase;

/// Operator credentials.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Session overview shown when the console loads.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatus {
    pub logged_in: bool,
    /// True when the backend runs without a storage connection.
    pub degraded: bool,
    pub phase: VisibleConsolePhase,
}

/// Generic action acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

impl ActionResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Backup of every stored document.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExportResponse {
    /// RFC 3339 timestamp of the export.
    pub exported_at: String,
    /// Stored documents by key; keys never written are omitted.
    #[schema(value_type = Object)]
    pub documents: BTreeMap<String, Value>,
}

/// Backup written back to the store, in the shape produced by an export.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RestoreRequest {
    /// Documents by key; unknown keys are skipped.
    #[schema(value_type = Object)]
    pub documents: BTreeMap<String, Value>,
}
