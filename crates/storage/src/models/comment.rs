use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Contest, Photo};

/// Entity a comment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Commentable {
    Photo(Uuid),
    Contest(Uuid),
}

impl Commentable {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Photo(_) => "photo",
            Self::Contest(_) => "contest",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Photo(id) | Self::Contest(id) => *id,
        }
    }

    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "photo" => Some(Self::Photo(id)),
            "contest" => Some(Self::Contest(id)),
            _ => None,
        }
    }
}

impl fmt::Display for Commentable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

pub trait HasComments {
    fn comment_target(&self) -> Commentable;
}

impl HasComments for Photo {
    fn comment_target(&self) -> Commentable {
        Commentable::Photo(self.photo_id)
    }
}

impl HasComments for Contest {
    fn comment_target(&self) -> Commentable {
        Commentable::Contest(self.contest_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    pub comment_id: Uuid,
    pub target: Commentable,
    pub user_id: Uuid,
    pub user_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commentable_round_trips_through_parts() {
        let id = Uuid::new_v4();
        let target = Commentable::Contest(id);
        assert_eq!(Commentable::from_parts(target.kind(), target.id()), Some(target));
        assert_eq!(Commentable::from_parts("message", id), None);
    }
}
