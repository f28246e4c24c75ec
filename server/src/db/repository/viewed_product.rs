//! Viewed Product Repository
//!
//! 浏览记录按 (user, product) 去重，重复浏览只刷新 `viewed_at`。

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::ViewedProduct;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "viewed_product";

/// How many recently-viewed entries a listing returns
pub const RECENT_LIMIT: usize = 10;

#[derive(Clone)]
pub struct ViewedProductRepository {
    base: BaseRepository,
}

impl ViewedProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Record a product view at `now_millis`, bumping the timestamp on repeats
    pub async fn record(&self, user_id: &str, product_id: &str, now_millis: i64) -> RepoResult<()> {
        let user = parse_record_id("user", user_id)?.to_string();
        let product = parse_record_id("product", product_id)?.to_string();

        let mut result = self
            .base
            .db()
            .query(
                "UPDATE viewed_product SET viewed_at = $now \
                 WHERE user = $user AND product = $product RETURN AFTER",
            )
            .bind(("now", now_millis))
            .bind(("user", user.clone()))
            .bind(("product", product.clone()))
            .await?;
        let updated: Vec<ViewedProduct> = result.take(0)?;
        if !updated.is_empty() {
            return Ok(());
        }

        let entry = ViewedProduct {
            id: None,
            user: parse_record_id("user", user_id)?,
            product: parse_record_id("product", product_id)?,
            viewed_at: now_millis,
        };
        let created: Option<ViewedProduct> = self.base.db().create(TABLE).content(entry).await?;
        created.ok_or_else(|| RepoError::Database("Failed to record product view".to_string()))?;
        Ok(())
    }

    /// Most recently viewed products for the user
    pub async fn find_recent_by_user(&self, user_id: &str) -> RepoResult<Vec<ViewedProduct>> {
        let user = parse_record_id("user", user_id)?.to_string();
        let viewed: Vec<ViewedProduct> = self
            .base
            .db()
            .query("SELECT * FROM viewed_product WHERE user = $user ORDER BY viewed_at DESC LIMIT 10")
            .bind(("user", user))
            .await?
            .take(0)?;
        Ok(viewed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;

    #[tokio::test]
    async fn test_repeat_view_bumps_timestamp_without_duplicating() {
        let db = connect_memory().await;
        let repo = ViewedProductRepository::new(db);

        repo.record("user:alice", "product:p1", 1_000).await.unwrap();
        repo.record("user:alice", "product:p2", 2_000).await.unwrap();
        repo.record("user:alice", "product:p1", 3_000).await.unwrap();

        let viewed = repo.find_recent_by_user("user:alice").await.unwrap();
        assert_eq!(viewed.len(), 2);
        // p1 moved to the front after the repeat view
        assert_eq!(viewed[0].product.to_string(), "product:p1");
        assert_eq!(viewed[0].viewed_at, 3_000);
        assert_eq!(viewed[1].product.to_string(), "product:p2");
    }

    #[tokio::test]
    async fn test_listing_is_capped_at_recent_limit() {
        let db = connect_memory().await;
        let repo = ViewedProductRepository::new(db);

        for i in 0..15 {
            repo.record("user:alice", &format!("product:p{i}"), i)
                .await
                .unwrap();
        }

        let viewed = repo.find_recent_by_user("user:alice").await.unwrap();
        assert_eq!(viewed.len(), RECENT_LIMIT);
        // Newest first: p14 down to p5
        assert_eq!(viewed[0].product.to_string(), "product:p14");
        assert_eq!(viewed[9].product.to_string(), "product:p5");
    }
}
