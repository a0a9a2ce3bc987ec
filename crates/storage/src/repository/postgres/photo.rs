use async_trait::async_trait;
use uuid::Uuid;

use super::PgRepo;
use crate::error::{Result, StorageError};
use crate::models::{Photo, ReportKind};
use crate::repository::PhotoRepo;

const PHOTO_COLUMNS: &str = r#"
    photo_id, user_id, title, description, country, location, gender, age,
    active, deleted, fake_count, abuse_count, created_at, updated_at
"#;

#[async_trait]
impl PhotoRepo for PgRepo {
    async fn photo_insert(&self, photo: &Photo) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO photos (
                photo_id, user_id, title, description, country, location, gender, age,
                active, deleted, fake_count, abuse_count, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(photo.photo_id)
        .bind(photo.user_id)
        .bind(&photo.title)
        .bind(&photo.description)
        .bind(&photo.country)
        .bind(&photo.location)
        .bind(&photo.gender)
        .bind(photo.age)
        .bind(photo.active)
        .bind(photo.deleted)
        .bind(photo.fake_count)
        .bind(photo.abuse_count)
        .bind(photo.created_at)
        .bind(photo.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let error = StorageError::from(e);
            if error.is_unique_violation() {
                return StorageError::ConstraintViolation("Photo already exists".to_string());
            }
            error
        })?;

        Ok(())
    }

    async fn photo_try_load(&self, photo_id: Uuid) -> Result<Option<Photo>> {
        let photo = sqlx::query_as::<_, Photo>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE photo_id = $1"
        ))
        .bind(photo_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(photo)
    }

    async fn photo_update(&self, photo: &Photo) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE photos
            SET
                title = $2,
                description = $3,
                country = $4,
                location = $5,
                gender = $6,
                age = $7,
                active = $8,
                updated_at = $9
            WHERE photo_id = $1
            "#,
        )
        .bind(photo.photo_id)
        .bind(&photo.title)
        .bind(&photo.description)
        .bind(&photo.country)
        .bind(&photo.location)
        .bind(&photo.gender)
        .bind(photo.age)
        .bind(photo.active)
        .bind(photo.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn photo_mark_deleted(&self, photo_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE photos
            SET deleted = TRUE, active = FALSE
            WHERE photo_id = $1
            "#,
        )
        .bind(photo_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn photo_remove(&self, photo_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM photos WHERE photo_id = $1")
            .bind(photo_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn photo_add_report(
        &self,
        photo_id: Uuid,
        reporter: Uuid,
        kind: ReportKind,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO photo_reports (photo_id, user_id, kind)
            VALUES ($1, $2, $3)
            ON CONFLICT (photo_id, user_id, kind) DO NOTHING
            "#,
        )
        .bind(photo_id)
        .bind(reporter)
        .bind(kind.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            let error = StorageError::from(e);
            if error.is_foreign_key_violation() {
                return StorageError::NotFound;
            }
            error
        })?
        .rows_affected()
            > 0;

        if inserted {
            let column = kind.counter_column();
            sqlx::query(&format!(
                "UPDATE photos SET {column} = {column} + 1 WHERE photo_id = $1"
            ))
            .bind(photo_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(inserted)
    }
}
