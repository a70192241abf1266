//! Database connection and operations
//!
//! Re-exports are provided for convenience, even if not all are used within the crate.

#![allow(unused_imports)]

pub mod comments;
pub mod composers;
pub mod list_query;
pub mod notices;
pub mod notifications;
pub mod posts;
pub mod sqlite_helpers;
pub mod users;

use std::str::FromStr;

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use comments::{CommentRecord, CommentRepository, CreateComment};
pub use composers::{
    ComposerRecord, ComposerRepository, Continent, CreateComposer, Era,
};
pub use list_query::{ListEntity, ListQuery, SqlValue};
pub use notices::{CreateNotice, NoticeRecord, NoticeRepository};
pub use notifications::{
    CreateNotification, NotificationFeedItem, NotificationRecord, NotificationRepository,
    NotificationType,
};
pub use posts::{
    CreatePost, CurationPostItem, PostRecord, PostRepository, PostStatus, PostType,
};
pub use users::{CreateUser, FollowOutcome, UserRecord, UserRepository};

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the maximum connection pool size from environment or default
    fn get_max_connections() -> u32 {
        std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10)
    }

    /// Create a new database connection pool. Accepts either a sqlite URL or
    /// a bare file path; the database file is created on first run.
    pub async fn connect(url: &str) -> Result<Self> {
        let url = if url.starts_with("sqlite:") {
            url.to_string()
        } else {
            format!("sqlite://{url}")
        };
        let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

        let max_connections = Self::get_max_connections();
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a users repository
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Get a composers repository
    pub fn composers(&self) -> ComposerRepository {
        ComposerRepository::new(self.pool.clone())
    }

    /// Get a posts repository
    pub fn posts(&self) -> PostRepository {
        PostRepository::new(self.pool.clone())
    }

    /// Get a notices repository
    pub fn notices(&self) -> NoticeRepository {
        NoticeRepository::new(self.pool.clone())
    }

    /// Get a comments repository
    pub fn comments(&self) -> CommentRepository {
        CommentRepository::new(self.pool.clone())
    }

    /// Get a notifications repository
    pub fn notifications(&self) -> NotificationRepository {
        NotificationRepository::new(self.pool.clone())
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}
