use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::contest::validate_gender;

/// Request payload for creating or editing a photo's metadata
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PhotoRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Title must be between 1 and 255 characters"
    ))]
    pub title: String,

    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,

    #[validate(length(max = 255))]
    #[serde(default)]
    pub country: String,

    #[validate(length(max = 255))]
    #[serde(default)]
    pub location: String,

    #[validate(custom(function = "validate_gender"))]
    #[serde(default)]
    pub gender: String,

    #[validate(range(min = 0, max = 130))]
    #[serde(default)]
    pub age: i32,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportResponse {
    /// `false` when the reporter had already filed this kind of report.
    pub recorded: bool,
}

/// Which removal a photo deletion ended up performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeleteOutcome {
    /// Kept for contest history, hidden from listings.
    Soft,
    Hard,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeletePhotoResponse {
    pub outcome: DeleteOutcome,
    pub votes_removed: u64,
}
