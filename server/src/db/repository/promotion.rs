//! Promotion Repository
//!
//! 单用户优惠码的消费走 `DELETE ... RETURN BEFORE`：
//! 并发使用同一个码时恰好一个请求删除成功，输家拿到空结果。

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Promotion, PromotionCreate};
use crate::utils::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "promotion";

#[derive(Clone)]
pub struct PromotionRepository {
    base: BaseRepository,
}

impl PromotionRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Active (non-expired) promotions, global codes only
    pub async fn find_active(&self) -> RepoResult<Vec<Promotion>> {
        let promotions: Vec<Promotion> = self
            .base
            .db()
            .query("SELECT * FROM promotion WHERE expires_at > $now AND user = NONE ORDER BY expires_at")
            .bind(("now", now_millis()))
            .await?
            .take(0)?;
        Ok(promotions)
    }

    /// Find a non-expired promotion with this code usable by this user:
    /// either a global code (no owner) or one scoped to the user.
    /// User-scoped codes take precedence over a global code with the same name.
    pub async fn find_applicable(&self, code: &str, user_id: &str) -> RepoResult<Option<Promotion>> {
        let code = code.to_string();
        // user is stored as a "user:id" string (or NONE for global codes)
        let user = parse_record_id("user", user_id)?.to_string();
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM promotion WHERE code = $code AND expires_at > $now \
                 AND (user = NONE OR user = $user) \
                 ORDER BY user DESC LIMIT 1",
            )
            .bind(("code", code))
            .bind(("now", now_millis()))
            .bind(("user", user))
            .await?;
        let promotions: Vec<Promotion> = result.take(0)?;
        Ok(promotions.into_iter().next())
    }

    /// Consume a single-use promotion
    ///
    /// Returns `true` only for the request that actually deleted the record.
    /// Global promotions are reusable and must not be passed here.
    pub async fn consume(&self, promotion_id: &RecordId) -> RepoResult<bool> {
        let mut result = self
            .base
            .db()
            .query("DELETE $promo RETURN BEFORE")
            .bind(("promo", promotion_id.clone()))
            .await?;
        let deleted: Vec<Promotion> = result.take(0)?;
        Ok(!deleted.is_empty())
    }

    pub async fn create(&self, data: PromotionCreate) -> RepoResult<Promotion> {
        if data.discount <= 0.0 {
            return Err(RepoError::Validation("Discount must be > 0".to_string()));
        }

        let user = match data.user {
            Some(ref id) => Some(parse_record_id("user", id)?),
            None => None,
        };

        let promotion = Promotion {
            id: None,
            code: data.code,
            discount: data.discount,
            kind: data.kind,
            min_order_value: data.min_order_value,
            expires_at: data.expires_at,
            user,
            created_at: now_millis(),
        };

        let created: Option<Promotion> = self.base.db().create(TABLE).content(promotion).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create promotion".to_string()))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let rid = parse_record_id(TABLE, id)?;
        let deleted: Option<Promotion> = self.base.db().delete(rid).await?;
        Ok(deleted.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::db::models::PromotionKind;

    fn promo(code: &str, user: Option<&str>, expires_in_millis: i64) -> PromotionCreate {
        PromotionCreate {
            code: code.to_string(),
            discount: 10.0,
            kind: PromotionKind::Percent,
            min_order_value: 0.0,
            expires_at: now_millis() + expires_in_millis,
            user: user.map(|u| u.to_string()),
        }
    }

    #[tokio::test]
    async fn test_expired_promotion_never_matches() {
        let db = connect_memory().await;
        let repo = PromotionRepository::new(db);
        repo.create(promo("OLD", None, -1_000)).await.unwrap();

        assert!(repo
            .find_applicable("OLD", "user:alice")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_user_scoped_promotion_invisible_to_others() {
        let db = connect_memory().await;
        let repo = PromotionRepository::new(db);
        repo.create(promo("MINE", Some("user:alice"), 60_000))
            .await
            .unwrap();

        assert!(repo
            .find_applicable("MINE", "user:alice")
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .find_applicable("MINE", "user:bob")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_consume_succeeds_exactly_once() {
        let db = connect_memory().await;
        let repo = PromotionRepository::new(db);
        let created = repo
            .create(promo("ONCE", Some("user:alice"), 60_000))
            .await
            .unwrap();
        let id = created.id.unwrap();

        assert!(repo.consume(&id).await.unwrap());
        assert!(!repo.consume(&id).await.unwrap());
    }
}
