//! Order Lifecycle Transitions
//!
//! 用户取消 + 管理员状态迁移。所有迁移都经过条件更新，
//! 与自动确认扫描竞争时输家重新读取订单再决定结果。

use super::{OrderError, OrderResult, OrderService};
use crate::db::models::{Order, OrderStatus};
use crate::inventory::StockLine;
use crate::utils::{minutes_since, now_millis};

/// Bound on re-reads when an admin transition keeps losing races
const MAX_TRANSITION_ATTEMPTS: u32 = 3;

impl OrderService {
    fn stock_lines(order: &Order) -> Vec<StockLine> {
        order
            .items
            .iter()
            .map(|item| StockLine {
                product: item.product.to_string(),
                quantity: item.quantity,
            })
            .collect()
    }

    /// Customer-initiated cancellation
    ///
    /// - `NEW` within the window: straight to `CANCELED`, stock restored.
    /// - `PREPARING`: to `CANCEL_REQUESTED`; stock stays reserved until an
    ///   admin decides.
    /// - Anything else: `CancellationWindowClosed`.
    pub async fn request_cancellation(
        &self,
        order_id: &str,
        requester_user_id: &str,
    ) -> OrderResult<Order> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("Order {order_id} not found")))?;

        if order.user.to_string() != requester_user_id {
            return Err(OrderError::Forbidden);
        }

        let now = now_millis();
        let elapsed_minutes = minutes_since(order.created_at, now);

        match order.status {
            OrderStatus::New if elapsed_minutes <= self.cancel_window_minutes => {
                let updated = self
                    .orders
                    .try_transition(
                        order_id,
                        OrderStatus::New,
                        OrderStatus::Canceled,
                        Some("Canceled by customer".to_string()),
                        now,
                    )
                    .await?;

                match updated {
                    Some(order) => {
                        // The conditional write won, so this is the only
                        // restoration for this order
                        self.inventory.restore(&Self::stock_lines(&order)).await?;
                        self.notify
                            .publish(
                                requester_user_id,
                                &format!("Order {} has been canceled", order.order_number),
                                "order",
                            )
                            .await;
                        Ok(order)
                    }
                    // Lost against the auto-confirm sweep; re-read and report
                    // the order as it is now
                    None => {
                        let current = self
                            .orders
                            .find_by_id(order_id)
                            .await?
                            .ok_or_else(|| OrderError::NotFound(format!("Order {order_id} not found")))?;
                        Err(OrderError::CancellationWindowClosed {
                            status: current.status,
                            elapsed_minutes,
                        })
                    }
                }
            }
            OrderStatus::Preparing => {
                let updated = self
                    .orders
                    .try_transition(
                        order_id,
                        OrderStatus::Preparing,
                        OrderStatus::CancelRequested,
                        Some("Cancellation requested by customer".to_string()),
                        now,
                    )
                    .await?;

                match updated {
                    Some(order) => {
                        self.notify
                            .publish(
                                requester_user_id,
                                &format!(
                                    "Cancellation requested for order {}",
                                    order.order_number
                                ),
                                "order",
                            )
                            .await;
                        Ok(order)
                    }
                    None => {
                        let current = self
                            .orders
                            .find_by_id(order_id)
                            .await?
                            .ok_or_else(|| OrderError::NotFound(format!("Order {order_id} not found")))?;
                        Err(OrderError::CancellationWindowClosed {
                            status: current.status,
                            elapsed_minutes,
                        })
                    }
                }
            }
            status => Err(OrderError::CancellationWindowClosed {
                status,
                elapsed_minutes,
            }),
        }
    }

    /// Admin-driven status change
    ///
    /// Accepts any non-terminal current status. Transition into `CANCELED`
    /// restores stock exactly once (including from `CANCEL_REQUESTED`, where
    /// the customer's request left it reserved). Transition into `DELIVERED`
    /// stamps `delivered_at`.
    pub async fn admin_set_status(
        &self,
        order_id: &str,
        new_status: &str,
        note: Option<String>,
    ) -> OrderResult<Order> {
        let target = OrderStatus::parse(new_status)
            .ok_or_else(|| OrderError::InvalidStatus(new_status.to_string()))?;

        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let order = self
                .orders
                .find_by_id(order_id)
                .await?
                .ok_or_else(|| OrderError::NotFound(format!("Order {order_id} not found")))?;

            if order.status.is_terminal() {
                return Err(OrderError::OrderAlreadyTerminal);
            }
            if order.status == target {
                return Ok(order);
            }

            let note = note
                .clone()
                .unwrap_or_else(|| format!("Status updated to {target} by admin"));
            let updated = self
                .orders
                .try_transition(order_id, order.status, target, Some(note), now_millis())
                .await?;

            let Some(updated) = updated else {
                // Another writer moved the order first; observe and retry
                continue;
            };

            if target == OrderStatus::Canceled {
                self.inventory
                    .restore(&Self::stock_lines(&updated))
                    .await?;
            }

            self.notify
                .publish(
                    &updated.user.to_string(),
                    &format!("Order {} is now {}", updated.order_number, target),
                    "order",
                )
                .await;

            return Ok(updated);
        }

        Err(OrderError::Database(format!(
            "Order {order_id} kept changing during status update"
        )))
    }
}
