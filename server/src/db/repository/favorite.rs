//! Favorite Repository
//!
//! (user, product) 的唯一索引保证收藏最多一条；重复收藏是幂等操作。

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::Favorite;
use crate::utils::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "favorite";

#[derive(Clone)]
pub struct FavoriteRepository {
    base: BaseRepository,
}

impl FavoriteRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Add a product to the user's favorites, idempotently
    pub async fn add(&self, user_id: &str, product_id: &str) -> RepoResult<Favorite> {
        if let Some(existing) = self.find(user_id, product_id).await? {
            return Ok(existing);
        }

        let favorite = Favorite {
            id: None,
            user: parse_record_id("user", user_id)?,
            product: parse_record_id("product", product_id)?,
            created_at: now_millis(),
        };

        let created: Option<Favorite> = self.base.db().create(TABLE).content(favorite).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create favorite".to_string()))
    }

    /// Remove a favorite; returns `false` when there was none
    pub async fn remove(&self, user_id: &str, product_id: &str) -> RepoResult<bool> {
        let user = parse_record_id("user", user_id)?.to_string();
        let product = parse_record_id("product", product_id)?.to_string();
        let mut result = self
            .base
            .db()
            .query("DELETE favorite WHERE user = $user AND product = $product RETURN BEFORE")
            .bind(("user", user))
            .bind(("product", product))
            .await?;
        let deleted: Vec<Favorite> = result.take(0)?;
        Ok(!deleted.is_empty())
    }

    /// The user's favorites, newest first
    pub async fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<Favorite>> {
        let user = parse_record_id("user", user_id)?.to_string();
        let favorites: Vec<Favorite> = self
            .base
            .db()
            .query("SELECT * FROM favorite WHERE user = $user ORDER BY created_at DESC")
            .bind(("user", user))
            .await?
            .take(0)?;
        Ok(favorites)
    }

    async fn find(&self, user_id: &str, product_id: &str) -> RepoResult<Option<Favorite>> {
        let user = parse_record_id("user", user_id)?.to_string();
        let product = parse_record_id("product", product_id)?.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM favorite WHERE user = $user AND product = $product LIMIT 1")
            .bind(("user", user))
            .bind(("product", product))
            .await?;
        let favorites: Vec<Favorite> = result.take(0)?;
        Ok(favorites.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let db = connect_memory().await;
        let repo = FavoriteRepository::new(db);

        let first = repo.add("user:alice", "product:p1").await.unwrap();
        let second = repo.add("user:alice", "product:p1").await.unwrap();
        assert_eq!(first.id, second.id);

        assert_eq!(repo.find_by_user("user:alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_and_isolation_between_users() {
        let db = connect_memory().await;
        let repo = FavoriteRepository::new(db);

        repo.add("user:alice", "product:p1").await.unwrap();
        repo.add("user:bob", "product:p1").await.unwrap();

        assert!(repo.remove("user:alice", "product:p1").await.unwrap());
        assert!(!repo.remove("user:alice", "product:p1").await.unwrap());

        // Bob's favorite is untouched
        assert_eq!(repo.find_by_user("user:bob").await.unwrap().len(), 1);
        assert!(repo.find_by_user("user:alice").await.unwrap().is_empty());
    }
}
