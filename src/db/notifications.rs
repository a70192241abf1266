//! User notifications database operations
//!
//! Notifications are written in the same transaction as the action that caused
//! them (a follow or a comment) and read back as a joined feed that carries the
//! sender's nickname. The sender join is single-valued, so unlike the curation
//! composer load it can live inside the paged query without multiplying rows.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::list_query::{ListEntity, ListQuery, SqlValue};
use crate::db::sqlite_helpers::{datetime_to_str, int_to_bool, now_str, str_to_datetime};
use crate::pagination::{CursorValue, Page, PageError, PageRequest, SortKey};

/// Notification type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Comment,
    Follow,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Comment => "comment",
            NotificationType::Follow => "follow",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "comment" => Some(NotificationType::Comment),
            "follow" => Some(NotificationType::Follow),
            _ => None,
        }
    }
}

/// A notification record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: i64,
    pub receiver_id: i64,
    pub sender_id: i64,
    pub post_id: Option<i64>,
    pub notification_type: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for NotificationRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let is_read: i64 = row.try_get("is_read")?;
        let created_at_str: String = row.try_get("created_at")?;
        let updated_at_str: String = row.try_get("updated_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            receiver_id: row.try_get("receiver_id")?,
            sender_id: row.try_get("sender_id")?,
            post_id: row.try_get("post_id")?,
            notification_type: row.try_get("notification_type")?,
            is_read: int_to_bool(is_read),
            created_at: str_to_datetime(&created_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            updated_at: str_to_datetime(&updated_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Input for creating a new notification
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub receiver_id: i64,
    pub sender_id: i64,
    pub post_id: Option<i64>,
    pub notification_type: NotificationType,
}

/// A notification as it appears in the feed, with the sender's nickname joined
/// in. The sender may have deleted their account, hence the LEFT JOIN and the
/// optional nickname.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeedItem {
    pub id: i64,
    pub receiver_id: i64,
    pub sender_id: i64,
    pub sender_nickname: Option<String>,
    pub post_id: Option<i64>,
    pub notification_type: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl ListEntity for NotificationFeedItem {
    const TABLE_NAME: &'static str = "notifications";

    fn select_sql() -> String {
        r#"SELECT n.id, n.receiver_id, n.sender_id, u.nickname AS sender_nickname,
                  n.post_id, n.notification_type, n.is_read, n.created_at
           FROM notifications n
           LEFT JOIN users u ON u.id = n.sender_id"#
            .to_string()
    }

    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;

        let is_read: i64 = row.try_get("is_read")?;
        let created_at_str: String = row.try_get("created_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            receiver_id: row.try_get("receiver_id")?,
            sender_id: row.try_get("sender_id")?,
            sender_nickname: row.try_get("sender_nickname")?,
            post_id: row.try_get("post_id")?,
            notification_type: row.try_get("notification_type")?,
            is_read: int_to_bool(is_read),
            created_at: str_to_datetime(&created_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }

    fn sort_value(&self, column: &str) -> CursorValue {
        match column {
            "created_at" => CursorValue::Timestamp(self.created_at),
            _ => CursorValue::Int(self.id),
        }
    }
}

/// Notifications repository for database operations
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a notification by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<NotificationRecord>> {
        let record =
            sqlx::query_as::<_, NotificationRecord>("SELECT * FROM notifications WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(record)
    }

    /// A receiver's notification feed, newest first, limited to the retention
    /// window. Older notifications stay in the table but never surface.
    pub async fn list_recent(
        &self,
        receiver_id: i64,
        window_days: i64,
        request: &PageRequest,
        max_size: i64,
    ) -> Result<Page<NotificationFeedItem>, PageError> {
        let key = SortKey::recency_qualified("n");
        let cutoff = Utc::now() - Duration::days(window_days);

        ListQuery::new()
            .filter("n.receiver_id = ?", SqlValue::Int(receiver_id))
            .filter(
                "n.created_at >= ?",
                SqlValue::Text(datetime_to_str(cutoff)),
            )
            .fetch_page(&self.pool, &key, request, max_size)
            .await
    }

    /// Unread notification count within the retention window
    pub async fn unread_count(&self, receiver_id: i64, window_days: i64) -> Result<i64> {
        let cutoff = Utc::now() - Duration::days(window_days);
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE receiver_id = ?1 AND is_read = 0 AND created_at >= ?2
            "#,
        )
        .bind(receiver_id)
        .bind(datetime_to_str(cutoff))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Mark a notification as read. Returns false when the id does not exist,
    /// belongs to another receiver, or was already read.
    pub async fn mark_as_read(&self, id: i64, receiver_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = 1, updated_at = ?3
            WHERE id = ?1 AND receiver_id = ?2 AND is_read = 0
            "#,
        )
        .bind(id)
        .bind(receiver_id)
        .bind(now_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Insert a notification inside an open transaction
pub async fn insert_notification(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    notification: &CreateNotification,
) -> Result<i64> {
    let now = now_str();
    let result = sqlx::query(
        r#"
        INSERT INTO notifications (
            receiver_id, sender_id, post_id, notification_type,
            is_read, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)
        "#,
    )
    .bind(notification.receiver_id)
    .bind(notification.sender_id)
    .bind(notification.post_id)
    .bind(notification.notification_type.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}
