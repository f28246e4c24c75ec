//! Notification Sink
//!
//! 尽力而为的通知写入：失败只记日志，永远不会把成功的业务操作变成失败。

use crate::db::models::Notification;
use crate::db::repository::{NotificationRepository, RepoResult};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct NotificationService {
    notifications: NotificationRepository,
}

impl NotificationService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            notifications: NotificationRepository::new(db),
        }
    }

    /// Persist a notification, best-effort
    ///
    /// Errors are logged and swallowed — callers never fail because a
    /// notification could not be written.
    pub async fn publish(&self, user_id: &str, message: &str, category: &str) {
        if let Err(e) = self.notifications.create(user_id, message, category).await {
            tracing::warn!(
                target: "notify",
                user = %user_id,
                category = %category,
                error = %e,
                "Failed to persist notification"
            );
        }
    }

    /// Most recent 50 notifications for the user
    pub async fn list(&self, user_id: &str) -> RepoResult<Vec<Notification>> {
        self.notifications.find_recent_by_user(user_id).await
    }

    /// Mark a notification read; false when it is not the user's
    pub async fn mark_read(&self, user_id: &str, notification_id: &str) -> RepoResult<bool> {
        self.notifications.mark_read(user_id, notification_id).await
    }
}
