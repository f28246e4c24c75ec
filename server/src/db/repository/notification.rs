//! Notification Repository

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::Notification;
use crate::utils::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "notification";

#[derive(Clone)]
pub struct NotificationRepository {
    base: BaseRepository,
}

impl NotificationRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(
        &self,
        user_id: &str,
        message: &str,
        category: &str,
    ) -> RepoResult<Notification> {
        let notification = Notification {
            id: None,
            user: parse_record_id("user", user_id)?,
            message: message.to_string(),
            category: category.to_string(),
            is_read: false,
            created_at: now_millis(),
        };
        let created: Option<Notification> =
            self.base.db().create(TABLE).content(notification).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create notification".to_string()))
    }

    /// Most recent 50 notifications for the user
    pub async fn find_recent_by_user(&self, user_id: &str) -> RepoResult<Vec<Notification>> {
        // user is stored as a "user:id" string
        let user = parse_record_id("user", user_id)?.to_string();
        let notifications: Vec<Notification> = self
            .base
            .db()
            .query("SELECT * FROM notification WHERE user = $user ORDER BY created_at DESC LIMIT 50")
            .bind(("user", user))
            .await?
            .take(0)?;
        Ok(notifications)
    }

    /// Mark one notification read; returns false when it does not belong to
    /// the user (or does not exist)
    pub async fn mark_read(&self, user_id: &str, notification_id: &str) -> RepoResult<bool> {
        let user = parse_record_id("user", user_id)?.to_string();
        let rid = parse_record_id(TABLE, notification_id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET is_read = true WHERE user = $user RETURN AFTER")
            .bind(("thing", rid))
            .bind(("user", user))
            .await?;
        let updated: Vec<Notification> = result.take(0)?;
        Ok(!updated.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;

    #[tokio::test]
    async fn test_mark_read_checks_ownership() {
        let db = connect_memory().await;
        let repo = NotificationRepository::new(db);

        let created = repo
            .create("user:alice", "Your order is confirmed", "order")
            .await
            .unwrap();
        let id = created.id.unwrap().to_string();

        assert!(!repo.mark_read("user:bob", &id).await.unwrap());
        assert!(repo.mark_read("user:alice", &id).await.unwrap());

        let list = repo.find_recent_by_user("user:alice").await.unwrap();
        assert!(list[0].is_read);
    }
}
