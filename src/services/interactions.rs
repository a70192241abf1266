//! User interaction workflows
//!
//! Each workflow opens one transaction covering the action itself and the
//! notification events it raises.

use anyhow::{Context, Result, bail};
use sqlx::SqlitePool;

use crate::db::comments::{CreateComment, insert_comment};
use crate::db::notifications::NotificationType;
use crate::db::users::{FollowOutcome, insert_follow};
use crate::services::events::DomainEvents;

/// Service for follow and comment actions
pub struct InteractionService {
    pool: SqlitePool,
}

impl InteractionService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Follow a user, notifying the followee.
    ///
    /// Following yourself is rejected; following someone twice succeeds
    /// without a second notification.
    pub async fn follow_user(&self, follower_id: i64, followee_id: i64) -> Result<FollowOutcome> {
        if follower_id == followee_id {
            bail!("users cannot follow themselves");
        }

        let followee = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?1")
            .bind(followee_id)
            .fetch_optional(&self.pool)
            .await?;
        if followee.is_none() {
            bail!("user {followee_id} not found");
        }

        let mut tx = self.pool.begin().await?;
        let outcome = insert_follow(&mut tx, follower_id, followee_id).await?;

        if outcome == FollowOutcome::Followed {
            let mut events = DomainEvents::new();
            events.notify(followee_id, follower_id, None, NotificationType::Follow);
            events.flush(&mut tx).await?;
        }

        tx.commit().await?;
        tracing::debug!(follower_id, followee_id, ?outcome, "Follow processed");
        Ok(outcome)
    }

    /// Comment on a post, notifying the post's author.
    pub async fn add_comment(&self, comment: CreateComment) -> Result<i64> {
        let author_id = sqlx::query_scalar::<_, i64>("SELECT user_id FROM posts WHERE id = ?1")
            .bind(comment.post_id)
            .fetch_optional(&self.pool)
            .await?
            .with_context(|| format!("post {} not found", comment.post_id))?;

        let mut tx = self.pool.begin().await?;
        let comment_id = insert_comment(&mut tx, &comment).await?;

        let mut events = DomainEvents::new();
        events.notify(
            author_id,
            comment.user_id,
            Some(comment.post_id),
            NotificationType::Comment,
        );
        events.flush(&mut tx).await?;

        tx.commit().await?;
        tracing::debug!(comment_id, post_id = comment.post_id, "Comment created");
        Ok(comment_id)
    }
}
