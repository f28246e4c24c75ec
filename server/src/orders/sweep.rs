//! Automatic Order Confirmation
//!
//! NEW 订单两条自动确认路径，都走同一个条件迁移：
//!
//! - 结算时挂起的单次定时器 (进程存活时的精确路径)
//! - 周期扫描 (重启后补漏的兜底路径)
//!
//! 赢家只有一个；用户在窗口内取消则两条路径都落空。

use super::{OrderResult, OrderService};
use crate::db::models::OrderStatus;
use crate::utils::{minutes_to_millis, now_millis};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const CONFIRM_NOTE: &str = "Automatically confirmed";

impl OrderService {
    /// Arm a one-shot confirmation timer for a freshly placed order
    ///
    /// Fires after the auto-confirm delay and attempts `NEW -> CONFIRMED`.
    /// Losing the race (the customer canceled, or an admin moved the order)
    /// is a silent no-op. The timer dies with the process; the periodic
    /// sweep picks up anything it missed.
    pub(crate) fn arm_confirm_timer(&self, order_id: String) {
        let service = self.clone();
        let delay = Duration::from_millis(minutes_to_millis(self.auto_confirm_minutes) as u64);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match service.try_confirm(&order_id).await {
                Ok(true) => {
                    tracing::info!(target: "orders", order = %order_id, "Order auto-confirmed by timer");
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        target: "orders",
                        order = %order_id,
                        error = %e,
                        "Confirm timer failed"
                    );
                }
            }
        });
    }

    /// Confirm every NEW order older than the auto-confirm delay
    ///
    /// Returns how many orders this call confirmed. Per-order failures are
    /// logged and skipped so one bad record cannot stall the sweep.
    pub async fn sweep_stale_orders(&self, now: i64) -> OrderResult<usize> {
        let cutoff = now - minutes_to_millis(self.auto_confirm_minutes);
        let stale = self.orders.find_stale_new(cutoff).await?;

        let mut confirmed = 0;
        for order in stale {
            let Some(id) = &order.id else { continue };
            match self.try_confirm(&id.to_string()).await {
                Ok(true) => confirmed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        target: "orders",
                        order = %id,
                        error = %e,
                        "Failed to auto-confirm order"
                    );
                }
            }
        }

        Ok(confirmed)
    }

    /// One conditional `NEW -> CONFIRMED` attempt; false when the race is lost
    async fn try_confirm(&self, order_id: &str) -> OrderResult<bool> {
        let updated = self
            .orders
            .try_transition(
                order_id,
                OrderStatus::New,
                OrderStatus::Confirmed,
                Some(CONFIRM_NOTE.to_string()),
                now_millis(),
            )
            .await?;

        match updated {
            Some(order) => {
                self.notify
                    .publish(
                        &order.user.to_string(),
                        &format!("Order {} has been confirmed", order.order_number),
                        "order",
                    )
                    .await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Periodic sweep loop, runs until the token is cancelled
    pub async fn run_confirm_sweeper(self, interval_secs: u64, token: CancellationToken) {
        let interval = Duration::from_secs(interval_secs);
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(target: "orders", "Confirm sweeper stopped");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    match self.sweep_stale_orders(now_millis()).await {
                        Ok(0) => {}
                        Ok(n) => {
                            tracing::info!(target: "orders", confirmed = n, "Auto-confirmed stale orders");
                        }
                        Err(e) => {
                            tracing::error!(target: "orders", error = %e, "Order sweep failed");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::db::connect_memory;
    use crate::db::models::{
        LineItem, Order, PaymentMethod, ShippingInfo, StatusHistoryEntry,
    };
    use crate::db::repository::OrderRepository;
    use surrealdb::Surreal;
    use surrealdb::engine::local::Db;

    fn sample_order(user: &str, status: OrderStatus, created_at: i64) -> Order {
        Order {
            id: None,
            order_number: format!("ORD{created_at}-{user}"),
            user: user.parse().unwrap(),
            items: vec![LineItem {
                product: "product:p1".parse().unwrap(),
                name: "Widget".to_string(),
                quantity: 1,
                unit_price: 5.0,
                line_total: 5.0,
            }],
            total_amount: 5.0,
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

    async fn service(db: &Surreal<Db>) -> OrderService {
        OrderService::new(db.clone(), &Config::default())
    }

    #[tokio::test]
    async fn test_sweep_confirms_only_stale_new_orders() {
        let db = connect_memory().await;
        let svc = service(&db).await;
        let repo = OrderRepository::new(db.clone());
        let now = now_millis();
        let old = now - minutes_to_millis(svc.auto_confirm_minutes + 5);

        let stale = repo.create(sample_order("user:a", OrderStatus::New, old)).await.unwrap();
        let fresh = repo.create(sample_order("user:b", OrderStatus::New, now)).await.unwrap();
        let canceled = repo
            .create(sample_order("user:c", OrderStatus::Canceled, old))
            .await
            .unwrap();

        let confirmed = svc.sweep_stale_orders(now).await.unwrap();
        assert_eq!(confirmed, 1);

        let stale = repo.find_by_id(&stale.id.unwrap().to_string()).await.unwrap().unwrap();
        assert_eq!(stale.status, OrderStatus::Confirmed);
        assert_eq!(stale.status_history.last().unwrap().note.as_deref(), Some(CONFIRM_NOTE));

        let fresh = repo.find_by_id(&fresh.id.unwrap().to_string()).await.unwrap().unwrap();
        assert_eq!(fresh.status, OrderStatus::New);
        let canceled = repo.find_by_id(&canceled.id.unwrap().to_string()).await.unwrap().unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let db = connect_memory().await;
        let svc = service(&db).await;
        let repo = OrderRepository::new(db.clone());
        let now = now_millis();
        let old = now - minutes_to_millis(svc.auto_confirm_minutes + 5);

        repo.create(sample_order("user:a", OrderStatus::New, old)).await.unwrap();

        assert_eq!(svc.sweep_stale_orders(now).await.unwrap(), 1);
        assert_eq!(svc.sweep_stale_orders(now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_confirm_after_cancel_is_noop() {
        let db = connect_memory().await;
        let svc = service(&db).await;
        let repo = OrderRepository::new(db.clone());
        let now = now_millis();

        let order = repo
            .create(sample_order("user:a", OrderStatus::Canceled, now))
            .await
            .unwrap();
        let id = order.id.unwrap().to_string();

        assert!(!svc.try_confirm(&id).await.unwrap());
        let order = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Canceled);
        assert_eq!(order.status_history.len(), 1);
    }

    #[tokio::test]
    async fn test_sweeper_loop_stops_on_cancellation() {
        let db = connect_memory().await;
        let svc = service(&db).await;
        let token = CancellationToken::new();

        let handle = tokio::spawn(svc.run_confirm_sweeper(3600, token.clone()));
        token.cancel();
        handle.await.unwrap();
    }
}
