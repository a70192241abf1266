//! Users and follow-relationship database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::sqlite_helpers::{now_str, str_to_datetime};

/// A user record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for UserRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let created_at_str: String = row.try_get("created_at")?;
        let updated_at_str: String = row.try_get("updated_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            nickname: row.try_get("nickname")?,
            created_at: str_to_datetime(&created_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            updated_at: str_to_datetime(&updated_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub nickname: String,
}

/// Outcome of a follow request. Following someone twice is not an error; the
/// second attempt reports `AlreadyFollowing` and has no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
}

/// Users repository for database operations
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, user: CreateUser) -> Result<UserRecord> {
        let now = now_str();
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, nickname, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&user.email)
        .bind(&user.nickname)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve user after insert"))
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }
}

/// Insert a follow edge inside an open transaction.
///
/// Runs in the same transaction as the notification it triggers, so either
/// both land or neither does.
pub async fn insert_follow(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    follower_id: i64,
    followee_id: i64,
) -> Result<FollowOutcome> {
    let now = now_str();
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO user_follows (follower_id, followee_id, created_at)
        VALUES (?1, ?2, ?3)
        "#,
    )
    .bind(follower_id)
    .bind(followee_id)
    .bind(&now)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        Ok(FollowOutcome::AlreadyFollowing)
    } else {
        Ok(FollowOutcome::Followed)
    }
}
