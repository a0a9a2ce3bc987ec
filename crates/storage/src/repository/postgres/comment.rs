use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::PgRepo;
use crate::error::Result;
use crate::models::{Comment, Commentable};
use crate::repository::CommentRepo;

#[derive(FromRow)]
struct CommentRow {
    comment_id: Uuid,
    user_id: Uuid,
    user_name: String,
    body: String,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl CommentRepo for PgRepo {
    async fn comment_insert(&self, comment: &Comment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (
                comment_id, target_kind, target_id, user_id, user_name, body, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(comment.comment_id)
        .bind(comment.target.kind())
        .bind(comment.target.id())
        .bind(comment.user_id)
        .bind(&comment.user_name)
        .bind(&comment.body)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn comment_list(&self, target: Commentable) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT comment_id, user_id, user_name, body, created_at
            FROM comments
            WHERE target_kind = $1 AND target_id = $2
            ORDER BY created_at, comment_id
            "#,
        )
        .bind(target.kind())
        .bind(target.id())
        .fetch_all(&self.pool)
        .await?;

        let comments = rows
            .into_iter()
            .map(|row| Comment {
                comment_id: row.comment_id,
                target,
                user_id: row.user_id,
                user_name: row.user_name,
                body: row.body,
                created_at: row.created_at,
            })
            .collect();

        Ok(comments)
    }
}
