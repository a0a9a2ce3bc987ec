use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Photo {
    pub photo_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub country: String,
    pub location: String,
    pub gender: String,
    pub age: i32,
    pub active: bool,
    pub deleted: bool,
    pub fake_count: i32,
    pub abuse_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Photo {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Copy of the display and filter fields stored inside each vote.
    pub fn snapshot(&self) -> PhotoSnapshot {
        PhotoSnapshot {
            photo_user_id: self.user_id,
            title: self.title.clone(),
            description: self.description.clone(),
            country: self.country.clone(),
            location: self.location.clone(),
            age: self.age,
            gender: self.gender.clone(),
            active: self.active,
        }
    }
}

/// Photo fields denormalized into a vote at write time.
///
/// Rankings group and filter on these values without joining photos, so a
/// later edit or deletion of the photo does not invalidate past votes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PhotoSnapshot {
    pub photo_user_id: Uuid,
    pub title: String,
    pub description: String,
    pub country: String,
    pub location: String,
    pub age: i32,
    pub gender: String,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Fake,
    Abuse,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fake => "fake",
            Self::Abuse => "abuse",
        }
    }

    pub fn counter_column(&self) -> &'static str {
        match self {
            Self::Fake => "fake_count",
            Self::Abuse => "abuse_count",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fake" => Ok(Self::Fake),
            "abuse" => Ok(Self::Abuse),
            other => Err(format!("unknown report kind '{other}'")),
        }
    }
}
