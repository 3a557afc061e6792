use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dao::models::TeamEntity, dto::validation::validate_not_blank};

/// Payload used to register a team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TeamInput {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    /// Opaque logo reference.
    #[serde(default)]
    pub image_ref: Option<String>,
}

/// Public projection of a team.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct TeamSummary {
    pub team_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl From<TeamEntity> for TeamSummary {
    fn from(value: TeamEntity) -> Self {
        Self {
            team_id: value.team_id,
            name: value.name,
            image_ref: value.image_ref,
        }
    }
}
