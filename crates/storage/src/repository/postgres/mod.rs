mod comment;
mod contest;
mod photo;
mod vote;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::Filter;

/// PostgreSQL implementation of every repository trait.
#[derive(Clone, Debug)]
pub struct PgRepo {
    pool: PgPool,
}

impl PgRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Blank values on the row side count as "anywhere".
fn push_text_match(query: &mut QueryBuilder<'_, Postgres>, column: &str, wanted: &str) {
    if wanted.is_empty() {
        return;
    }
    query.push(format!(" AND ({column} = "));
    query.push_bind(wanted.to_string());
    query.push(format!(" OR {column} = '')"));
}

/// Narrows a query over `votes` by the photo snapshot columns.
fn push_snapshot_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    push_text_match(query, "country", &filter.country);
    push_text_match(query, "location", &filter.location);

    if filter.min_age > 0 {
        query.push(" AND age >= ");
        query.push_bind(filter.min_age);
    }

    if filter.max_age > 0 {
        query.push(" AND age <= ");
        query.push_bind(filter.max_age);
    }

    if !filter.gender.is_empty() {
        query.push(" AND gender = ");
        query.push_bind(filter.gender.clone());
    }
}

/// Narrows a query over `contests`: the contest's age window must cover the
/// filter's.
fn push_contest_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    push_text_match(query, "country", &filter.country);
    push_text_match(query, "location", &filter.location);

    if filter.min_age > 0 {
        query.push(" AND min_age <= ");
        query.push_bind(filter.min_age);
    }

    if filter.max_age > 0 {
        query.push(" AND max_age >= ");
        query.push_bind(filter.max_age);
    }

    if !filter.gender.is_empty() {
        query.push(" AND gender = ");
        query.push_bind(filter.gender.clone());
    }
}
