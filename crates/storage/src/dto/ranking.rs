use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::common::PaginationParams;
use crate::error::EngineResult;
use crate::models::Filter;

/// Demographic narrowing accepted by every listing endpoint.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct FilterParams {
    pub country: Option<String>,
    pub location: Option<String>,
    /// `"25"` or `"18-30"`.
    pub age: Option<String>,
    pub gender: Option<String>,
}

impl FilterParams {
    /// `None` when no field narrows anything.
    pub fn to_filter(&self) -> EngineResult<Option<Filter>> {
        let filter = Filter::new(
            self.country.as_deref(),
            self.location.as_deref(),
            self.age.as_deref(),
            self.gender.as_deref(),
        )?;

        Ok((!filter.is_empty()).then_some(filter))
    }
}

/// Query string of ranking listings. Kept flat: url-encoded numbers do not
/// survive `#[serde(flatten)]`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RankingQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
}

impl RankingQuery {
    pub fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            page_size: self.page_size.unwrap_or(defaults.page_size),
        }
    }

    pub fn filter_params(&self) -> FilterParams {
        FilterParams {
            country: self.country.clone(),
            location: self.location.clone(),
            age: self.age.clone(),
            gender: self.gender.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankingEntry {
    pub rank: i64,
    pub photo_id: Uuid,
    pub photo_user_id: Uuid,
    pub title: String,
    pub description: String,
    pub count: i64,
    /// Mean of the raw heart scores.
    pub average: f64,
    /// Confidence-adjusted score on the 1..5 scale, `0` without votes.
    pub wilson: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PhotoVotesResponse {
    pub average: f64,
    pub count: i64,
}
