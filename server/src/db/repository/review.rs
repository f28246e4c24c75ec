//! Review Repository

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::Review;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "review";

#[derive(Clone)]
pub struct ReviewRepository {
    base: BaseRepository,
}

impl ReviewRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, review: Review) -> RepoResult<Review> {
        let created: Option<Review> = self.base.db().create(TABLE).content(review).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create review".to_string()))
    }

    /// Rated reviews for a product, newest first
    pub async fn find_rated_by_product(&self, product_id: &str) -> RepoResult<Vec<Review>> {
        // Reference fields are stored as "table:id" strings
        let product = parse_record_id("product", product_id)?.to_string();
        let reviews: Vec<Review> = self
            .base
            .db()
            .query(
                "SELECT * FROM review WHERE product = $product AND rating != NONE \
                 ORDER BY created_at DESC",
            )
            .bind(("product", product))
            .await?
            .take(0)?;
        Ok(reviews)
    }

    /// Plain comments (no rating) for a product, newest first
    pub async fn find_comments_by_product(&self, product_id: &str) -> RepoResult<Vec<Review>> {
        let product = parse_record_id("product", product_id)?.to_string();
        let reviews: Vec<Review> = self
            .base
            .db()
            .query(
                "SELECT * FROM review WHERE product = $product AND rating = NONE \
                 ORDER BY created_at DESC",
            )
            .bind(("product", product))
            .await?
            .take(0)?;
        Ok(reviews)
    }

    /// Whether the user already posted a rated review for this product
    pub async fn has_rated(&self, user_id: &str, product_id: &str) -> RepoResult<bool> {
        let user = parse_record_id("user", user_id)?.to_string();
        let product = parse_record_id("product", product_id)?.to_string();
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() FROM review WHERE user = $user AND product = $product \
                 AND rating != NONE GROUP ALL",
            )
            .bind(("user", user))
            .bind(("product", product))
            .await?;
        let count: Option<i64> = result.take((0, "count"))?;
        Ok(count.unwrap_or(0) > 0)
    }

    /// Product IDs the user has rated
    pub async fn rated_product_ids(&self, user_id: &str) -> RepoResult<Vec<String>> {
        let user = parse_record_id("user", user_id)?.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT product FROM review WHERE user = $user AND rating != NONE")
            .bind(("user", user))
            .await?;
        let ids: Vec<String> = result.take((0, "product"))?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::utils::now_millis;

    fn review(user: &str, product: &str, rating: Option<i32>) -> Review {
        Review {
            id: None,
            user: user.parse().unwrap(),
            product: product.parse().unwrap(),
            rating,
            comment: "nice".to_string(),
            created_at: now_millis(),
        }
    }

    #[tokio::test]
    async fn test_rated_and_comments_are_separate() {
        let db = connect_memory().await;
        let repo = ReviewRepository::new(db);

        repo.create(review("user:a", "product:p1", Some(5))).await.unwrap();
        repo.create(review("user:b", "product:p1", None)).await.unwrap();

        assert_eq!(repo.find_rated_by_product("product:p1").await.unwrap().len(), 1);
        assert_eq!(
            repo.find_comments_by_product("product:p1").await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_has_rated() {
        let db = connect_memory().await;
        let repo = ReviewRepository::new(db);

        repo.create(review("user:a", "product:p1", Some(4))).await.unwrap();
        repo.create(review("user:a", "product:p2", None)).await.unwrap();

        assert!(repo.has_rated("user:a", "product:p1").await.unwrap());
        // A plain comment is not a rating
        assert!(!repo.has_rated("user:a", "product:p2").await.unwrap());
    }

    #[tokio::test]
    async fn test_rated_product_ids() {
        let db = connect_memory().await;
        let repo = ReviewRepository::new(db);

        repo.create(review("user:a", "product:p1", Some(4))).await.unwrap();
        repo.create(review("user:a", "product:p2", Some(3))).await.unwrap();

        let mut ids = repo.rated_product_ids("user:a").await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["product:p1", "product:p2"]);
    }
}
