//! Order Repository
//!
//! 所有状态迁移都是条件更新 (`WHERE status = $from`)：
//! 定时器、扫描和用户取消并发竞争同一订单时，恰好一个赢家，
//! 输家拿到空结果而不是覆盖历史。

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Order, OrderStatus, StatusHistoryEntry};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub fn record_id(id: &str) -> RepoResult<RecordId> {
        parse_record_id(TABLE, id)
    }

    /// Allocate the next order number: `ORD<yyyymmdd><counter>`
    ///
    /// The counter lives in a single `counter:order` record and is bumped
    /// atomically, so concurrent checkouts never collide.
    pub async fn next_order_number(&self, now_millis: i64) -> RepoResult<String> {
        #[derive(serde::Deserialize)]
        struct Counter {
            value: i64,
        }

        let mut result = self
            .base
            .db()
            .query("UPSERT counter:order SET value += 1 RETURN AFTER")
            .await?;
        let counters: Vec<Counter> = result.take(0)?;
        let value = counters
            .first()
            .map(|c| c.value)
            .ok_or_else(|| RepoError::Database("Failed to bump order counter".to_string()))?;

        let date = chrono::DateTime::from_timestamp_millis(now_millis)
            .ok_or_else(|| RepoError::Validation("Invalid timestamp".to_string()))?
            .format("%Y%m%d");

        Ok(format!("ORD{date}{value}"))
    }

    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let rid = Self::record_id(id)?;
        let order: Option<Order> = self.base.db().select(rid).await?;
        Ok(order)
    }

    pub async fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<Order>> {
        // user is stored as a "user:id" string
        let user = parse_record_id("user", user_id)?.to_string();
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE user = $user ORDER BY created_at DESC")
            .bind(("user", user))
            .await?
            .take(0)?;
        Ok(orders)
    }

    pub async fn find_by_status(&self, status: OrderStatus) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE status = $status ORDER BY created_at DESC")
            .bind(("status", status))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Orders still NEW and created at or before `cutoff_millis`
    pub async fn find_stale_new(&self, cutoff_millis: i64) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE status = $status AND created_at <= $cutoff")
            .bind(("status", OrderStatus::New))
            .bind(("cutoff", cutoff_millis))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Whether the user has a DELIVERED order containing the product
    pub async fn has_delivered_product(&self, user_id: &str, product_id: &str) -> RepoResult<bool> {
        let user = parse_record_id("user", user_id)?.to_string();
        let product = parse_record_id("product", product_id)?.to_string();
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() FROM order WHERE user = $user AND status = $status \
                 AND items.product CONTAINS $product GROUP ALL",
            )
            .bind(("user", user))
            .bind(("status", OrderStatus::Delivered))
            .bind(("product", product))
            .await?;
        let count: Option<i64> = result.take((0, "count"))?;
        Ok(count.unwrap_or(0) > 0)
    }

    /// Atomic conditional status transition
    ///
    /// Moves the order from `from` to `to` and appends the history entry in a
    /// single conditional write. Returns `None` when the order is no longer in
    /// `from` — the caller lost the race and must re-read to decide what to do.
    pub async fn try_transition(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
        note: Option<String>,
        now_millis: i64,
    ) -> RepoResult<Option<Order>> {
        let rid = Self::record_id(order_id)?;
        let entry = StatusHistoryEntry {
            status: to,
            timestamp: now_millis,
            note,
        };

        // delivered_at is written exactly once, on the transition into DELIVERED
        let query = if to == OrderStatus::Delivered {
            "UPDATE $order SET status = $to, status_history += $entry, delivered_at = $now \
             WHERE status = $from RETURN AFTER"
        } else {
            "UPDATE $order SET status = $to, status_history += $entry \
             WHERE status = $from RETURN AFTER"
        };

        let mut result = self
            .base
            .db()
            .query(query)
            .bind(("order", rid))
            .bind(("to", to))
            .bind(("entry", entry))
            .bind(("from", from))
            .bind(("now", now_millis))
            .await?;
        let updated: Vec<Order> = result.take(0)?;
        Ok(updated.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::db::models::{LineItem, PaymentMethod, ShippingInfo};
    use crate::utils::now_millis;

    fn sample_order(user: &str, status: OrderStatus, created_at: i64) -> Order {
        Order {
            id: None,
            order_number: format!("ORD{}-{}", created_at, user),
            user: user.parse().unwrap(),
            items: vec![LineItem {
                product: "product:p1".parse().unwrap(),
                name: "Widget".to_string(),
                quantity: 2,
                unit_price: 5.0,
                line_total: 10.0,
            }],
            total_amount: 10.0,
            discount_amount: 0.0,
            payment_method: PaymentMethod::Cod,
            status,
            status_history: vec![StatusHistoryEntry {
                status,
                timestamp: created_at,
                note: None,
            }],
            shipping: ShippingInfo {
                name: "Alice".to_string(),
                address: "1 Main St".to_string(),
                phone: "555-0100".to_string(),
            },
            note: None,
            created_at,
            delivered_at: None,
        }
    }

    #[tokio::test]
    async fn test_order_numbers_are_unique_and_increasing() {
        let db = connect_memory().await;
        let repo = OrderRepository::new(db);
        let now = now_millis();

        let a = repo.next_order_number(now).await.unwrap();
        let b = repo.next_order_number(now).await.unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("ORD"));
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_transition_appends_history() {
        let db = connect_memory().await;
        let repo = OrderRepository::new(db);
        let now = now_millis();

        let order = repo
            .create(sample_order("user:alice", OrderStatus::New, now))
            .await
            .unwrap();
        let id = order.id.unwrap().to_string();

        let updated = repo
            .try_transition(&id, OrderStatus::New, OrderStatus::Confirmed, None, now)
            .await
            .unwrap()
            .expect("transition should win");

        assert_eq!(updated.status, OrderStatus::Confirmed);
        assert_eq!(updated.status_history.len(), 2);
        assert_eq!(updated.status_history.last().unwrap().status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_transition_loses_when_status_moved() {
        let db = connect_memory().await;
        let repo = OrderRepository::new(db);
        let now = now_millis();

        let order = repo
            .create(sample_order("user:alice", OrderStatus::Canceled, now))
            .await
            .unwrap();
        let id = order.id.unwrap().to_string();

        let result = repo
            .try_transition(&id, OrderStatus::New, OrderStatus::Confirmed, None, now)
            .await
            .unwrap();
        assert!(result.is_none());

        // Loser must not have touched the record
        let unchanged = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, OrderStatus::Canceled);
        assert_eq!(unchanged.status_history.len(), 1);
    }

    #[tokio::test]
    async fn test_delivered_transition_sets_delivered_at() {
        let db = connect_memory().await;
        let repo = OrderRepository::new(db);
        let now = now_millis();

        let order = repo
            .create(sample_order("user:alice", OrderStatus::Delivering, now))
            .await
            .unwrap();
        let id = order.id.unwrap().to_string();

        let updated = repo
            .try_transition(&id, OrderStatus::Delivering, OrderStatus::Delivered, None, now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.delivered_at, Some(now));
    }

    #[tokio::test]
    async fn test_find_stale_new_filters_by_cutoff() {
        let db = connect_memory().await;
        let repo = OrderRepository::new(db);
        let now = now_millis();

        repo.create(sample_order("user:a", OrderStatus::New, now - 100_000))
            .await
            .unwrap();
        repo.create(sample_order("user:b", OrderStatus::New, now))
            .await
            .unwrap();
        repo.create(sample_order("user:c", OrderStatus::Confirmed, now - 100_000))
            .await
            .unwrap();

        let stale = repo.find_stale_new(now - 50_000).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].user.to_string(), "user:a");
    }

    #[tokio::test]
    async fn test_has_delivered_product() {
        let db = connect_memory().await;
        let repo = OrderRepository::new(db);
        let now = now_millis();

        let mut order = sample_order("user:alice", OrderStatus::Delivered, now);
        order.delivered_at = Some(now);
        repo.create(order).await.unwrap();

        assert!(repo
            .has_delivered_product("user:alice", "product:p1")
            .await
            .unwrap());
        assert!(!repo
            .has_delivered_product("user:alice", "product:p2")
            .await
            .unwrap());
        assert!(!repo
            .has_delivered_product("user:bob", "product:p1")
            .await
            .unwrap());
    }
}
