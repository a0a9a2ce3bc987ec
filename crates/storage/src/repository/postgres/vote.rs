use async_trait::async_trait;
use sqlx::{FromRow, QueryBuilder};
use uuid::Uuid;

use super::{PgRepo, push_snapshot_filter};
use crate::error::{Result, StorageError};
use crate::models::{PhotoSnapshot, Vote, VoteKey};
use crate::repository::{VoteHistogram, VoteRepo, VoteScope, VoteSelection};

const VOTE_COLUMNS: &str = r#"
    vote_id, photo_id, photo_user_id, title, description, country, location,
    age, gender, active, contest_id, score, user_id, updated_at
"#;

#[derive(FromRow)]
struct HistogramRow {
    photo_id: Uuid,
    photo_user_id: Uuid,
    title: String,
    description: String,
    count: i64,
    ones: i64,
    twos: i64,
    threes: i64,
    fours: i64,
    fives: i64,
    score_sum: f64,
}

#[async_trait]
impl VoteRepo for PgRepo {
    async fn vote_upsert(&self, vote: &Vote) -> Result<Vote> {
        let mut tx = self.pool.begin().await?;

        // Holds off a concurrent contest delete until this vote is committed.
        if let Some(contest_id) = vote.contest_id {
            sqlx::query("SELECT 1 FROM contests WHERE contest_id = $1 FOR KEY SHARE")
                .bind(contest_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StorageError::NotFound)?;
        }

        let stored = sqlx::query_as::<_, Vote>(&format!(
            r#"
            INSERT INTO votes (
                vote_id, photo_id, photo_user_id, title, description, country, location,
                age, gender, active, contest_id, score, user_id, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT ON CONSTRAINT votes_unique_key
            DO UPDATE SET
                photo_user_id = EXCLUDED.photo_user_id,
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                country = EXCLUDED.country,
                location = EXCLUDED.location,
                age = EXCLUDED.age,
                gender = EXCLUDED.gender,
                active = EXCLUDED.active,
                score = EXCLUDED.score,
                updated_at = EXCLUDED.updated_at
            RETURNING {VOTE_COLUMNS}
            "#
        ))
        .bind(vote.vote_id)
        .bind(vote.photo_id)
        .bind(vote.snapshot.photo_user_id)
        .bind(&vote.snapshot.title)
        .bind(&vote.snapshot.description)
        .bind(&vote.snapshot.country)
        .bind(&vote.snapshot.location)
        .bind(vote.snapshot.age)
        .bind(&vote.snapshot.gender)
        .bind(vote.snapshot.active)
        .bind(vote.contest_id)
        .bind(vote.score)
        .bind(vote.user_id)
        .bind(vote.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(stored)
    }

    async fn vote_try_load(&self, key: &VoteKey) -> Result<Option<Vote>> {
        let vote = sqlx::query_as::<_, Vote>(&format!(
            r#"
            SELECT {VOTE_COLUMNS}
            FROM votes
            WHERE photo_id = $1 AND user_id = $2 AND contest_id IS NOT DISTINCT FROM $3
            "#
        ))
        .bind(key.photo_id)
        .bind(key.user_id)
        .bind(key.contest_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vote)
    }

    async fn vote_list_for_photo(&self, photo_id: Uuid) -> Result<Vec<Vote>> {
        let votes = sqlx::query_as::<_, Vote>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE photo_id = $1 ORDER BY updated_at"
        ))
        .bind(photo_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(votes)
    }

    async fn vote_refresh_snapshots(
        &self,
        photo_id: Uuid,
        snapshot: &PhotoSnapshot,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE votes
            SET
                photo_user_id = $2,
                title = $3,
                description = $4,
                country = $5,
                location = $6,
                age = $7,
                gender = $8,
                active = $9
            WHERE photo_id = $1
            "#,
        )
        .bind(photo_id)
        .bind(snapshot.photo_user_id)
        .bind(&snapshot.title)
        .bind(&snapshot.description)
        .bind(&snapshot.country)
        .bind(&snapshot.location)
        .bind(snapshot.age)
        .bind(&snapshot.gender)
        .bind(snapshot.active)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn vote_remove_for_photo(&self, photo_id: Uuid, open_only: bool) -> Result<u64> {
        let mut builder = QueryBuilder::new("DELETE FROM votes WHERE photo_id = ");
        builder.push_bind(photo_id);
        if open_only {
            builder.push(" AND contest_id IS NULL");
        }

        let result = builder.build().execute(&self.pool).await?;

        Ok(result.rows_affected())
    }

    async fn vote_histograms(&self, selection: &VoteSelection) -> Result<Vec<VoteHistogram>> {
        let mut builder = QueryBuilder::new(
            r#"
            SELECT
                photo_id,
                (ARRAY_AGG(photo_user_id ORDER BY updated_at DESC))[1] AS photo_user_id,
                (ARRAY_AGG(title ORDER BY updated_at DESC))[1] AS title,
                (ARRAY_AGG(description ORDER BY updated_at DESC))[1] AS description,
                COUNT(*) AS count,
                COUNT(*) FILTER (WHERE score < 2) AS ones,
                COUNT(*) FILTER (WHERE score >= 2 AND score < 3) AS twos,
                COUNT(*) FILTER (WHERE score >= 3 AND score < 4) AS threes,
                COUNT(*) FILTER (WHERE score >= 4 AND score < 5) AS fours,
                COUNT(*) FILTER (WHERE score >= 5) AS fives,
                COALESCE(SUM(score), 0)::DOUBLE PRECISION AS score_sum
            FROM votes
            WHERE 1=1
            "#,
        );

        match selection.scope {
            VoteScope::Open => {
                builder.push(" AND contest_id IS NULL");
            }
            VoteScope::Contest(contest_id) => {
                builder.push(" AND contest_id = ");
                builder.push_bind(contest_id);
            }
            VoteScope::Photo(photo_id) => {
                builder.push(" AND photo_id = ");
                builder.push_bind(photo_id);
            }
        }

        if selection.active_only {
            builder.push(" AND active = TRUE");
        }

        if let Some(ref filter) = selection.filter {
            push_snapshot_filter(&mut builder, filter);
        }

        builder.push(" GROUP BY photo_id ORDER BY photo_id");

        let rows: Vec<HistogramRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        let histograms = rows
            .into_iter()
            .map(|row| VoteHistogram {
                photo_id: row.photo_id,
                photo_user_id: row.photo_user_id,
                title: row.title,
                description: row.description,
                count: row.count,
                buckets: [row.ones, row.twos, row.threes, row.fours, row.fives],
                score_sum: row.score_sum,
            })
            .collect();

        Ok(histograms)
    }
}
