//! Comments database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::sqlite_helpers::{now_str, str_to_datetime};

/// A comment record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for CommentRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let created_at_str: String = row.try_get("created_at")?;
        let updated_at_str: String = row.try_get("updated_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            post_id: row.try_get("post_id")?,
            user_id: row.try_get("user_id")?,
            content: row.try_get("content")?,
            created_at: str_to_datetime(&created_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            updated_at: str_to_datetime(&updated_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Input for creating a new comment
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
}

/// Comments repository for database operations
pub struct CommentRepository {
    pool: SqlitePool,
}

impl CommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a comment by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<CommentRecord>> {
        let record = sqlx::query_as::<_, CommentRecord>("SELECT * FROM comments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Comments on a post, oldest first
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>> {
        let records = sqlx::query_as::<_, CommentRecord>(
            r#"
            SELECT * FROM comments
            WHERE post_id = ?1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

/// Insert a comment inside an open transaction.
///
/// Comment creation and the notification it triggers commit together, so this
/// takes the transaction rather than the pool.
pub async fn insert_comment(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    comment: &CreateComment,
) -> Result<i64> {
    let now = now_str();
    let result = sqlx::query(
        r#"
        INSERT INTO comments (post_id, user_id, content, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(comment.post_id)
    .bind(comment.user_id)
    .bind(&comment.content)
    .bind(&now)
    .bind(&now)
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}
