use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Contest, PhotoSnapshot};
use crate::error::{EngineError, EngineResult};

const MAX_AGE: i32 = 130;

/// Demographic predicate narrowing which photos and contests are visible.
///
/// Zero ages and empty strings mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Filter {
    pub country: String,
    pub location: String,
    pub min_age: i32,
    pub max_age: i32,
    pub gender: String,
}

impl Filter {
    pub fn new(
        country: Option<&str>,
        location: Option<&str>,
        age: Option<&str>,
        gender: Option<&str>,
    ) -> EngineResult<Self> {
        let (min_age, max_age) = Self::parse_age(age.unwrap_or_default())?;

        Ok(Self {
            country: country.unwrap_or_default().trim().to_string(),
            location: location.unwrap_or_default().trim().to_string(),
            min_age,
            max_age,
            gender: gender.unwrap_or_default().trim().to_string(),
        })
    }

    /// Parses `""`, `"N"` or `"A-B"` into `(min, max)` age bounds.
    pub fn parse_age(age: &str) -> EngineResult<(i32, i32)> {
        let age = age.trim();
        if age.is_empty() {
            return Ok((0, 0));
        }

        let invalid = || EngineError::validation("Invalid age range");
        let parse_bound = |s: &str| -> EngineResult<i32> {
            let value: i32 = s.trim().parse().map_err(|_| invalid())?;
            if (0..=MAX_AGE).contains(&value) {
                Ok(value)
            } else {
                Err(invalid())
            }
        };

        match age.split('-').collect::<Vec<_>>().as_slice() {
            [single] => {
                let value = parse_bound(single)?;
                Ok((value, value))
            }
            [min, max] => Ok((parse_bound(min)?, parse_bound(max)?)),
            _ => Err(invalid()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn age_label(&self) -> String {
        let mut label = String::new();
        if self.min_age != 0 {
            label.push_str(&self.min_age.to_string());
        }
        if self.max_age != 0 && self.max_age != self.min_age {
            label.push_str(&format!(" - {}", self.max_age));
        }
        label
    }

    /// Photo-side match, applied to the snapshot stored in each vote.
    pub fn matches_snapshot(&self, snapshot: &PhotoSnapshot) -> bool {
        matches_text(&self.country, &snapshot.country)
            && matches_text(&self.location, &snapshot.location)
            && (self.min_age <= 0 || snapshot.age >= self.min_age)
            && (self.max_age <= 0 || snapshot.age <= self.max_age)
            && (self.gender.is_empty() || self.gender == snapshot.gender)
    }

    /// Contest-side match: the contest's age window must cover the filter's.
    pub fn matches_contest(&self, contest: &Contest) -> bool {
        matches_text(&self.country, &contest.country)
            && matches_text(&self.location, &contest.location)
            && (self.min_age <= 0 || contest.min_age <= self.min_age)
            && (self.max_age <= 0 || contest.max_age >= self.max_age)
            && (self.gender.is_empty() || self.gender == contest.gender)
    }
}

// A blank value on the record side counts as "anywhere".
fn matches_text(wanted: &str, actual: &str) -> bool {
    wanted.is_empty() || actual.is_empty() || wanted == actual
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let age = self.age_label();
        let parts: Vec<String> = [
            ("country", self.country.as_str()),
            ("location", self.location.as_str()),
            ("age", age.as_str()),
            ("gender", self.gender.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| format!("{name}: {value}"))
        .collect();

        f.write_str(&parts.join(", "))
    }
}
