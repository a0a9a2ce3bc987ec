use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, QueryBuilder};
use uuid::Uuid;

use super::{PgRepo, push_contest_filter};
use crate::error::{Result, StorageError};
use crate::models::{Contest, Phase, RegItem};
use crate::repository::{ContestQuery, ContestRepo, RegistrationOutcome};

const CONTEST_COLUMNS: &str = r#"
    contest_id, user_id, name, description, country, location, gender,
    min_age, max_age, admission_deadline, voting_deadline, public,
    require_approval, created_at
"#;

#[derive(FromRow)]
struct RegistrationRow {
    contest_id: Uuid,
    #[sqlx(flatten)]
    item: RegItem,
}

impl PgRepo {
    async fn attach_registrations(&self, contests: &mut [Contest]) -> Result<()> {
        if contests.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = contests.iter().map(|c| c.contest_id).collect();
        let rows = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT contest_id, user_id, user_name, user_info, photo_id, title,
                   description, approved
            FROM contest_registrations
            WHERE contest_id = ANY($1)
            ORDER BY position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_contest: HashMap<Uuid, Vec<RegItem>> = HashMap::new();
        for row in rows {
            by_contest.entry(row.contest_id).or_default().push(row.item);
        }

        for contest in contests.iter_mut() {
            contest.registered = by_contest.remove(&contest.contest_id).unwrap_or_default();
        }

        Ok(())
    }
}

#[async_trait]
impl ContestRepo for PgRepo {
    async fn contest_insert(&self, contest: &Contest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO contests (
                contest_id, user_id, name, description, country, location, gender,
                min_age, max_age, admission_deadline, voting_deadline, public,
                require_approval, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(contest.contest_id)
        .bind(contest.user_id)
        .bind(&contest.name)
        .bind(&contest.description)
        .bind(&contest.country)
        .bind(&contest.location)
        .bind(&contest.gender)
        .bind(contest.min_age)
        .bind(contest.max_age)
        .bind(contest.admission_deadline)
        .bind(contest.voting_deadline)
        .bind(contest.public)
        .bind(contest.require_approval)
        .bind(contest.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let error = StorageError::from(e);
            if error.is_unique_violation() {
                return StorageError::ConstraintViolation("Contest already exists".to_string());
            }
            error
        })?;

        Ok(())
    }

    async fn contest_try_load(&self, contest_id: Uuid) -> Result<Option<Contest>> {
        let contest = sqlx::query_as::<_, Contest>(&format!(
            "SELECT {CONTEST_COLUMNS} FROM contests WHERE contest_id = $1"
        ))
        .bind(contest_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(contest) = contest else {
            return Ok(None);
        };

        let mut contests = [contest];
        self.attach_registrations(&mut contests).await?;
        let [contest] = contests;

        Ok(Some(contest))
    }

    async fn contest_update_draft(&self, contest: &Contest) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE contests
            SET
                name = $3,
                description = $4,
                country = $5,
                location = $6,
                gender = $7,
                min_age = $8,
                max_age = $9,
                admission_deadline = $10,
                voting_deadline = $11,
                require_approval = $12
            WHERE contest_id = $1 AND user_id = $2 AND public = FALSE
            "#,
        )
        .bind(contest.contest_id)
        .bind(contest.user_id)
        .bind(&contest.name)
        .bind(&contest.description)
        .bind(&contest.country)
        .bind(&contest.location)
        .bind(&contest.gender)
        .bind(contest.min_age)
        .bind(contest.max_age)
        .bind(contest.admission_deadline)
        .bind(contest.voting_deadline)
        .bind(contest.require_approval)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn contest_publish(&self, contest_id: Uuid, owner: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE contests
            SET public = TRUE
            WHERE contest_id = $1 AND user_id = $2
            "#,
        )
        .bind(contest_id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn contest_remove(&self, contest_id: Uuid, owner: Uuid) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM contests WHERE contest_id = $1 AND user_id = $2")
            .bind(contest_id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        if removed.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        sqlx::query(
            r#"
            DELETE FROM votes cv
            WHERE cv.contest_id = $1
              AND EXISTS (
                  SELECT 1 FROM votes ov
                  WHERE ov.contest_id IS NULL
                    AND ov.photo_id = cv.photo_id
                    AND ov.user_id = cv.user_id
              )
            "#,
        )
        .bind(contest_id)
        .execute(&mut *tx)
        .await?;

        let detached = sqlx::query("UPDATE votes SET contest_id = NULL WHERE contest_id = $1")
            .bind(contest_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(detached.rows_affected())
    }

    async fn contest_list(&self, query: &ContestQuery) -> Result<Vec<Contest>> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {CONTEST_COLUMNS} FROM contests WHERE 1=1"
        ));

        if let Some((phase, now)) = query.phase {
            match phase {
                Phase::Admission => {
                    builder.push(" AND admission_deadline > ");
                    builder.push_bind(now);
                }
                Phase::Voting => {
                    builder.push(" AND admission_deadline <= ");
                    builder.push_bind(now);
                    builder.push(" AND voting_deadline > ");
                    builder.push_bind(now);
                }
                Phase::Finished => {
                    builder.push(" AND voting_deadline <= ");
                    builder.push_bind(now);
                }
            }
        }

        if query.public_only {
            builder.push(" AND public = TRUE");
        }

        if let Some(owner) = query.owner {
            builder.push(" AND user_id = ");
            builder.push_bind(owner);
        }

        if let Some(ref filter) = query.filter {
            push_contest_filter(&mut builder, filter);
        }

        builder.push(" ORDER BY created_at DESC, contest_id");

        let mut contests: Vec<Contest> = builder.build_query_as().fetch_all(&self.pool).await?;
        self.attach_registrations(&mut contests).await?;

        Ok(contests)
    }

    async fn registration_upsert(
        &self,
        contest_id: Uuid,
        item: &RegItem,
    ) -> Result<RegistrationOutcome> {
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO contest_registrations (
                contest_id, user_id, user_name, user_info, photo_id, title,
                description, approved
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (contest_id, user_id)
            DO UPDATE SET
                photo_id = EXCLUDED.photo_id,
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                approved = EXCLUDED.approved
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(contest_id)
        .bind(item.user_id)
        .bind(&item.user_name)
        .bind(&item.user_info)
        .bind(item.photo_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.approved)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let error = StorageError::from(e);
            if error.is_foreign_key_violation() {
                return StorageError::NotFound;
            }
            error
        })?;

        Ok(if inserted {
            RegistrationOutcome::Inserted
        } else {
            RegistrationOutcome::Updated
        })
    }

    async fn registration_approve(&self, contest_id: Uuid, user_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE contest_registrations
            SET approved = TRUE
            WHERE contest_id = $1 AND user_id = $2
            "#,
        )
        .bind(contest_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn registration_remove(&self, contest_id: Uuid, user_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM contest_registrations WHERE contest_id = $1 AND user_id = $2",
        )
        .bind(contest_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn photo_is_registered(&self, photo_id: Uuid) -> Result<bool> {
        let registered: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM contest_registrations WHERE photo_id = $1)",
        )
        .bind(photo_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(registered)
    }
}
