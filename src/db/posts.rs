//! Posts database operations
//!
//! Posts come in three kinds sharing one table: free posts, story posts, and
//! curation posts. Curation posts carry composers; listing them goes through a
//! two-phase hydration so the one-to-many load never multiplies the paged rows.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::composers::{ComposerRecord, ComposerRepository, Continent, Era};
use crate::db::list_query::{ListEntity, ListQuery, SqlValue};
use crate::db::sqlite_helpers::{int_to_bool, now_str, str_to_datetime};
use crate::pagination::{
    CursorValue, Page, PageError, PageRequest, SortKey, apply_cursor_to_sorted,
};

/// Kind of post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    Free,
    Story,
    Curation,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Free => "free",
            PostType::Story => "story",
            PostType::Curation => "curation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(PostType::Free),
            "story" => Some(PostType::Story),
            "curation" => Some(PostType::Curation),
            _ => None,
        }
    }
}

/// Publication status of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }
}

/// A post record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: i64,
    pub user_id: i64,
    pub post_type: String,
    pub title: String,
    pub content: String,
    pub post_status: String,
    pub is_blocked: bool,
    pub primary_composer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for PostRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let is_blocked: i64 = row.try_get("is_blocked")?;
        let created_at_str: String = row.try_get("created_at")?;
        let updated_at_str: String = row.try_get("updated_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            post_type: row.try_get("post_type")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            post_status: row.try_get("post_status")?,
            is_blocked: int_to_bool(is_blocked),
            primary_composer_id: row.try_get("primary_composer_id")?,
            created_at: str_to_datetime(&created_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            updated_at: str_to_datetime(&updated_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

impl ListEntity for PostRecord {
    const TABLE_NAME: &'static str = "posts";

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

/// Input for creating a new post
#[derive(Debug, Clone)]
pub struct CreatePost {
    pub user_id: i64,
    pub post_type: PostType,
    pub title: String,
    pub content: String,
    pub post_status: PostStatus,
    pub primary_composer_id: Option<i64>,
}

/// A curation post with its composers attached
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurationPostItem {
    #[serde(flatten)]
    pub post: PostRecord,
    pub composers: Vec<ComposerRecord>,
}

/// Posts repository for database operations
pub struct PostRepository {
    pool: SqlitePool,
}

impl PostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new post
    pub async fn create(&self, post: CreatePost) -> Result<PostRecord> {
        let now = now_str();
        let result = sqlx::query(
            r#"
            INSERT INTO posts (
                user_id, post_type, title, content, post_status,
                is_blocked, primary_composer_id, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8)
            "#,
        )
        .bind(post.user_id)
        .bind(post.post_type.as_str())
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.post_status.as_str())
        .bind(post.primary_composer_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve post after insert"))
    }

    /// Get a post by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<PostRecord>> {
        let record = sqlx::query_as::<_, PostRecord>("SELECT * FROM posts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Base query for publicly visible posts of one kind.
    fn public_feed(post_type: PostType) -> ListQuery<PostRecord> {
        ListQuery::new()
            .filter("post_type = ?", SqlValue::Text(post_type.as_str().into()))
            .filter(
                "post_status = ?",
                SqlValue::Text(PostStatus::Published.as_str().into()),
            )
            .filter("is_blocked = ?", SqlValue::Bool(false))
    }

    /// Public free-board feed, newest first
    pub async fn list_free(
        &self,
        request: &PageRequest,
        max_size: i64,
    ) -> Result<Page<PostRecord>, PageError> {
        let key = SortKey::recency();
        Self::public_feed(PostType::Free)
            .fetch_page(&self.pool, &key, request, max_size)
            .await
    }

    /// Public story feed, newest first
    pub async fn list_story(
        &self,
        request: &PageRequest,
        max_size: i64,
    ) -> Result<Page<PostRecord>, PageError> {
        let key = SortKey::recency();
        Self::public_feed(PostType::Story)
            .fetch_page(&self.pool, &key, request, max_size)
            .await
    }

    /// Public curation feed with optional era/continent filters, composers
    /// attached.
    ///
    /// Phase one pages over bare post rows; the era/continent filters resolve
    /// through the primary composer via a subquery, so the paged query stays
    /// one row per post. Phase two bulk-loads the composer lists for exactly
    /// the returned page.
    pub async fn list_curation(
        &self,
        era: Option<Era>,
        continent: Option<Continent>,
        request: &PageRequest,
        max_size: i64,
    ) -> Result<Page<CurationPostItem>, PageError> {
        let key = SortKey::recency();
        let mut query = Self::public_feed(PostType::Curation);

        if let Some(era) = era {
            query = query.filter(
                "primary_composer_id IN (SELECT id FROM composers WHERE era = ?)",
                SqlValue::Text(era.as_str().into()),
            );
        }
        if let Some(continent) = continent {
            query = query.filter(
                "primary_composer_id IN (SELECT id FROM composers WHERE continent = ?)",
                SqlValue::Text(continent.as_str().into()),
            );
        }

        let page = query.fetch_page(&self.pool, &key, request, max_size).await?;

        let post_ids: Vec<i64> = page.items.iter().map(|p| p.id).collect();
        let mut composers_by_post = ComposerRepository::new(self.pool.clone())
            .for_posts(&post_ids)
            .await?;

        Ok(page.map(|post| {
            let composers = composers_by_post.remove(&post.id).unwrap_or_default();
            CurationPostItem { post, composers }
        }))
    }

    /// A user's own posts, optionally filtered by status. Drafts are visible
    /// here since the list is scoped to the author; moderated posts are hidden
    /// even from their author.
    pub async fn list_by_user(
        &self,
        user_id: i64,
        status: Option<PostStatus>,
        request: &PageRequest,
        max_size: i64,
    ) -> Result<Page<PostRecord>, PageError> {
        let key = SortKey::recency();
        let mut query = ListQuery::<PostRecord>::new()
            .filter("user_id = ?", SqlValue::Int(user_id))
            .filter("is_blocked = ?", SqlValue::Bool(false));

        if let Some(status) = status {
            query = query.filter(
                "post_status = ?",
                SqlValue::Text(status.as_str().into()),
            );
        }

        query.fetch_page(&self.pool, &key, request, max_size).await
    }

    /// All public posts mentioning a composer, merged across story and
    /// curation feeds.
    ///
    /// Two source queries feed this list: posts attached through the
    /// `post_composers` table, and posts naming the composer as primary. The
    /// results are merged, deduplicated by post id, and paged in memory; the
    /// cursor still applies exactly as it does for single-query feeds.
    pub async fn list_by_composer(
        &self,
        composer_id: i64,
        request: &PageRequest,
        max_size: i64,
    ) -> Result<Page<PostRecord>, PageError> {
        let key = SortKey::recency();
        let size = request.validated_size(max_size)?;
        let boundary = request.boundary(&key)?;

        let attached_sql = r#"
            SELECT p.* FROM posts p
            JOIN post_composers pc ON pc.post_id = p.id
            WHERE pc.composer_id = ?1
              AND p.post_type IN ('story', 'curation')
              AND p.post_status = 'published'
              AND p.is_blocked = 0
            "#;
        let primary_sql = r#"
            SELECT * FROM posts
            WHERE primary_composer_id = ?1
              AND post_type IN ('story', 'curation')
              AND post_status = 'published'
              AND is_blocked = 0
            "#;
        tracing::debug!(composer_id, "Executing composer feed queries");

        let mut posts = sqlx::query_as::<_, PostRecord>(attached_sql)
            .bind(composer_id)
            .fetch_all(&self.pool)
            .await?;
        let primary = sqlx::query_as::<_, PostRecord>(primary_sql)
            .bind(composer_id)
            .fetch_all(&self.pool)
            .await?;
        posts.extend(primary);

        // A curation post linked both ways arrives from both queries; the
        // id-keyed dedup keeps one copy. Equal sort keys mean equal ids here,
        // so duplicates are adjacent after the sort.
        posts.sort_by(|a, b| key.compare(&a.boundary(&key), &b.boundary(&key)));
        posts.dedup_by_key(|p| p.id);

        let kept = apply_cursor_to_sorted(posts, &key, boundary.as_deref(), size, |p| {
            p.boundary(&key)
        });

        Ok(Page::from_rows(kept, size, &key, |p| p.boundary(&key)))
    }
}
