//! Transactional notification events
//!
//! Actions that notify another user (follows, comments) queue an event while
//! the transaction is still open, and the queue is flushed into the
//! `notifications` table before commit. Either the action and its notification
//! both land or neither does; there is no window where one exists without the
//! other.

use anyhow::Result;

use crate::db::notifications::{CreateNotification, NotificationType, insert_notification};

/// A queue of notification events tied to one transaction's lifetime.
#[derive(Debug, Default)]
pub struct DomainEvents {
    queue: Vec<CreateNotification>,
}

impl DomainEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notification from `sender_id` to `receiver_id`. Events where a
    /// user would notify themselves are dropped.
    pub fn notify(
        &mut self,
        receiver_id: i64,
        sender_id: i64,
        post_id: Option<i64>,
        notification_type: NotificationType,
    ) {
        if receiver_id == sender_id {
            tracing::debug!(receiver_id, "Skipping self-notification");
            return;
        }
        self.queue.push(CreateNotification {
            receiver_id,
            sender_id,
            post_id,
            notification_type,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Write all queued events into the open transaction and clear the queue.
    /// Must run before the caller commits.
    pub async fn flush(&mut self, tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>) -> Result<()> {
        for event in self.queue.drain(..) {
            insert_notification(tx, &event).await?;
        }
        Ok(())
    }
}
