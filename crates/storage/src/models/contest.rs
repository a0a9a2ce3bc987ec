use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::Photo;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Contest {
    pub contest_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub country: String,
    pub location: String,
    pub gender: String,
    pub min_age: i32,
    pub max_age: i32,
    pub admission_deadline: DateTime<Utc>,
    pub voting_deadline: DateTime<Utc>,
    pub public: bool,
    pub require_approval: bool,
    pub created_at: DateTime<Utc>,
    /// Entries in registration order.
    #[sqlx(skip)]
    pub registered: Vec<RegItem>,
}

/// One photo entered into a contest by one registrant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RegItem {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_info: String,
    pub photo_id: Uuid,
    pub title: String,
    pub description: String,
    pub approved: bool,
}

/// Contest phase, always derived from the deadlines and the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Admission,
    Voting,
    Finished,
}

impl Phase {
    pub fn at(
        now: DateTime<Utc>,
        admission_deadline: DateTime<Utc>,
        voting_deadline: DateTime<Utc>,
    ) -> Self {
        if now < admission_deadline {
            Self::Admission
        } else if now < voting_deadline {
            Self::Voting
        } else {
            Self::Finished
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admission => "admission",
            Self::Voting => "voting",
            Self::Finished => "finished",
        }
    }
}

impl Contest {
    pub fn phase(&self, now: DateTime<Utc>) -> Phase {
        Phase::at(now, self.admission_deadline, self.voting_deadline)
    }

    pub fn can_register(&self, now: DateTime<Utc>) -> bool {
        self.phase(now) == Phase::Admission
    }

    pub fn can_vote(&self, now: DateTime<Utc>) -> bool {
        self.phase(now) == Phase::Voting
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Approval state a registration by `registrant` starts with.
    pub fn initial_approval(&self, registrant: Uuid) -> bool {
        !self.require_approval || self.is_owned_by(registrant)
    }

    pub fn to_be_approved(&self) -> Vec<&RegItem> {
        self.registered.iter().filter(|ri| !ri.approved).collect()
    }

    pub fn registration_of(&self, user_id: Uuid) -> Option<&RegItem> {
        self.registered.iter().find(|ri| ri.user_id == user_id)
    }

    pub fn registration_for_photo(&self, photo_id: Uuid) -> Option<&RegItem> {
        self.registered.iter().find(|ri| ri.photo_id == photo_id)
    }

    /// Whether the photo's demographics satisfy the contest's eligibility
    /// fields. Empty strings and zero ages impose no restriction.
    pub fn admits(&self, photo: &Photo) -> bool {
        let text_ok = |required: &str, actual: &str| required.is_empty() || required == actual;

        text_ok(&self.country, &photo.country)
            && text_ok(&self.location, &photo.location)
            && text_ok(&self.gender, &photo.gender)
            && (self.min_age <= 0 || photo.age >= self.min_age)
            && (self.max_age <= 0 || photo.age <= self.max_age)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn contest(now: DateTime<Utc>) -> Contest {
        Contest {
            contest_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Sunsets".to_string(),
            description: String::new(),
            country: String::new(),
            location: String::new(),
            gender: "f".to_string(),
            min_age: 18,
            max_age: 30,
            admission_deadline: now + Duration::days(5),
            voting_deadline: now + Duration::days(10),
            public: true,
            require_approval: true,
            created_at: now,
            registered: Vec::new(),
        }
    }

    #[test]
    fn test_phase_boundaries() {
        let now = Utc::now();
        let c = contest(now);

        assert_eq!(c.phase(now), Phase::Admission);
        assert!(c.can_register(now));
        assert!(!c.can_vote(now));

        let at_admission = c.admission_deadline;
        assert_eq!(c.phase(at_admission), Phase::Voting);
        assert!(!c.can_register(at_admission));
        assert!(c.can_vote(at_admission));

        let at_voting = c.voting_deadline;
        assert_eq!(c.phase(at_voting), Phase::Finished);
        assert!(!c.can_register(at_voting));
        assert!(!c.can_vote(at_voting));
    }

    #[test]
    fn test_initial_approval() {
        let now = Utc::now();
        let mut c = contest(now);
        let owner = c.user_id;

        assert!(!c.initial_approval(Uuid::new_v4()));
        assert!(c.initial_approval(owner));

        c.require_approval = false;
        assert!(c.initial_approval(Uuid::new_v4()));
    }

    #[test]
    fn test_to_be_approved_lists_pending_only() {
        let now = Utc::now();
        let mut c = contest(now);
        let item = |approved| RegItem {
            user_id: Uuid::new_v4(),
            user_name: "Ana".to_string(),
            user_info: String::new(),
            photo_id: Uuid::new_v4(),
            title: "t".to_string(),
            description: String::new(),
            approved,
        };
        c.registered = vec![item(true), item(false), item(false)];

        let pending = c.to_be_approved();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|ri| !ri.approved));
    }

    #[test]
    fn test_admits_checks_demographics() {
        let now = Utc::now();
        let c = contest(now);
        let mut photo = Photo {
            photo_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "t".to_string(),
            description: String::new(),
            country: "RO".to_string(),
            location: "Cluj".to_string(),
            gender: "f".to_string(),
            age: 25,
            active: true,
            deleted: false,
            fake_count: 0,
            abuse_count: 0,
            created_at: now,
            updated_at: now,
        };
        assert!(c.admits(&photo));

        photo.age = 31;
        assert!(!c.admits(&photo));

        photo.age = 25;
        photo.gender = "m".to_string();
        assert!(!c.admits(&photo));
    }
}
