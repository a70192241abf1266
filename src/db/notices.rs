//! Site notices database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::list_query::{ListEntity, ListQuery, SqlValue};
use crate::db::sqlite_helpers::{int_to_bool, now_str, str_to_datetime};
use crate::pagination::{CursorValue, Page, PageError, PageRequest, SortKey};

/// A notice record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeRecord {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for NoticeRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let published: i64 = row.try_get("published")?;
        let created_at_str: String = row.try_get("created_at")?;
        let updated_at_str: String = row.try_get("updated_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            published: int_to_bool(published),
            created_at: str_to_datetime(&created_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            updated_at: str_to_datetime(&updated_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

impl ListEntity for NoticeRecord {
    const TABLE_NAME: &'static str = "notices";

    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        sqlx::FromRow::from_row(row)
    }

    fn sort_value(&self, column: &str) -> CursorValue {
        match column {
            "created_at" => CursorValue::Timestamp(self.created_at),
            "title" => CursorValue::Text(self.title.clone()),
            _ => CursorValue::Int(self.id),
        }
    }
}

/// Input for creating a new notice
#[derive(Debug, Clone)]
pub struct CreateNotice {
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
}

/// Notices repository for database operations
pub struct NoticeRepository {
    pool: SqlitePool,
}

impl NoticeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new notice
    pub async fn create(&self, notice: CreateNotice) -> Result<NoticeRecord> {
        let now = now_str();
        let result = sqlx::query(
            r#"
            INSERT INTO notices (user_id, title, content, published, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(notice.user_id)
        .bind(&notice.title)
        .bind(&notice.content)
        .bind(if notice.published { 1i64 } else { 0i64 })
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve notice after insert"))
    }

    /// Get a notice by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<NoticeRecord>> {
        let record = sqlx::query_as::<_, NoticeRecord>("SELECT * FROM notices WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Published notices, newest first
    pub async fn list_published(
        &self,
        request: &PageRequest,
        max_size: i64,
    ) -> Result<Page<NoticeRecord>, PageError> {
        let key = SortKey::recency();
        ListQuery::new()
            .filter("published = ?", SqlValue::Bool(true))
            .fetch_page(&self.pool, &key, request, max_size)
            .await
    }
}
