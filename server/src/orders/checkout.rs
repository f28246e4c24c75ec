//! Checkout
//!
//! 副作用顺序 (见各步骤注释)：
//! 1. 库存预留 (可补偿：失败行之前的预留全部回补)
//! 2. 折扣解析 (积分扣减 + 促销码消费，失败时回补库存)
//! 3. 订单创建 (最后一步，订单永不删除，所以放在所有可失败步骤之后)
//! 4. 清空购物车、挂定时器、发通知 (均为尽力而为)

use super::{OrderError, OrderResult, OrderService};
use crate::db::models::{
    LineItem, Order, OrderStatus, PaymentMethod, ShippingInfo, StatusHistoryEntry,
};
use crate::inventory::StockLine;
use crate::pricing::{Resolution, money};
use crate::utils::now_millis;
use serde::Deserialize;
use validator::Validate;

/// Checkout request payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    #[validate(nested)]
    pub shipping: ShippingRequest,
    pub note: Option<String>,
    pub promotion_code: Option<String>,
    pub points: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ShippingRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub phone: String,
}

impl OrderService {
    /// Checkout the user's cart into a NEW order
    pub async fn checkout(&self, user_id: &str, req: CheckoutRequest) -> OrderResult<Order> {
        req.validate()
            .map_err(|_| OrderError::InvalidShippingInfo)?;

        let cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .filter(|c| !c.items.is_empty())
            .ok_or(OrderError::EmptyCart)?;

        // Snapshot products into line items
        let mut items = Vec::with_capacity(cart.items.len());
        let mut stock_lines = Vec::with_capacity(cart.items.len());
        let mut subtotal = rust_decimal::Decimal::ZERO;

        for cart_item in &cart.items {
            let product_id = cart_item.product.to_string();
            let product = self
                .products
                .find_by_id(&product_id)
                .await?
                .ok_or_else(|| OrderError::NotFound(format!("Product {product_id} not found")))?;

            let line_total = money::line_total(product.price, cart_item.quantity);
            subtotal += money::to_decimal(line_total);

            items.push(LineItem {
                product: cart_item.product.clone(),
                name: product.name,
                quantity: cart_item.quantity,
                unit_price: product.price,
                line_total,
            });
            stock_lines.push(StockLine {
                product: product_id,
                quantity: cart_item.quantity,
            });
        }
        let order_total = money::to_f64(subtotal);

        // 1. Reserve stock — all-or-nothing, rolls itself back on failure
        self.inventory.reserve(&stock_lines).await?;

        // 2. Resolve discounts — on failure the reservation is compensated
        let resolution = match self
            .resolver
            .resolve(
                order_total,
                req.promotion_code.as_deref(),
                req.points,
                user_id,
            )
            .await
        {
            Ok(res) => res,
            Err(e) => {
                self.inventory.restore(&stock_lines).await?;
                return Err(e);
            }
        };

        // 3. Create the order — last fallible step, so a stored order is
        //    always fully backed by its side effects
        let order = match self.persist_order(user_id, req, items, &resolution).await {
            Ok(order) => order,
            Err(e) => {
                self.compensate_failed_creation(user_id, &stock_lines, &resolution)
                    .await;
                return Err(e);
            }
        };

        // 4. Post-creation effects, none of them can fail the checkout
        if let Err(e) = self.carts.clear(user_id).await {
            tracing::warn!(target: "orders", user = %user_id, error = %e, "Failed to clear cart after checkout");
        }

        if let Some(id) = &order.id {
            self.arm_confirm_timer(id.to_string());
        }

        self.notify
            .publish(
                user_id,
                &format!("Order {} placed successfully", order.order_number),
                "order",
            )
            .await;

        tracing::info!(
            target: "orders",
            order_number = %order.order_number,
            user = %user_id,
            total = order.total_amount,
            discount = order.discount_amount,
            "Order created"
        );

        Ok(order)
    }

    async fn persist_order(
        &self,
        user_id: &str,
        req: CheckoutRequest,
        items: Vec<LineItem>,
        resolution: &Resolution,
    ) -> OrderResult<Order> {
        let now = now_millis();
        let order_number = self.orders.next_order_number(now).await?;
        let user = crate::db::repository::UserRepository::record_id(user_id)?;

        let order = Order {
            id: None,
            order_number,
            user,
            items,
            total_amount: resolution.final_amount,
            discount_amount: resolution.discount_amount,
            payment_method: req.payment_method,
            status: OrderStatus::New,
            status_history: vec![StatusHistoryEntry {
                status: OrderStatus::New,
                timestamp: now,
                note: Some("Order placed".to_string()),
            }],
            shipping: ShippingInfo {
                name: req.shipping.name,
                address: req.shipping.address,
                phone: req.shipping.phone,
            },
            note: req.note,
            created_at: now,
            delivered_at: None,
        };

        Ok(self.orders.create(order).await?)
    }

    /// Undo stock and points after a failed order write. A consumed
    /// user-scoped promotion cannot be recreated here; that loss is logged.
    async fn compensate_failed_creation(
        &self,
        user_id: &str,
        stock_lines: &[StockLine],
        resolution: &Resolution,
    ) {
        if let Err(e) = self.inventory.restore(stock_lines).await {
            tracing::error!(target: "orders", user = %user_id, error = %e, "Failed to restore stock after order creation failure");
        }
        if resolution.points_used > 0
            && let Err(e) = self.users.credit_points(user_id, resolution.points_used).await
        {
            tracing::error!(target: "orders", user = %user_id, error = %e, "Failed to refund points after order creation failure");
        }
        if let Some(code) = &resolution.applied_code {
            tracing::error!(
                target: "orders",
                user = %user_id,
                code = %code,
                "Order creation failed after promotion was consumed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::db::connect_memory;
    use crate::db::models::{ProductCreate, PromotionCreate, PromotionKind, User};
    use crate::db::repository::{
        CartRepository, ProductRepository, PromotionRepository, UserRepository,
    };
    use surrealdb::Surreal;
    use surrealdb::engine::local::Db;

    async fn setup(db: &Surreal<Db>) -> OrderService {
        let mut config = Config::default();
        config.cancel_window_minutes = 30;
        config.auto_confirm_minutes = 30;
        OrderService::new(db.clone(), &config)
    }

    async fn seed_user(db: &Surreal<Db>, points: i64) -> String {
        let mut user = User::new("Alice".to_string(), "a@example.com".to_string(), now_millis());
        user.points = points;
        UserRepository::new(db.clone())
            .create(user)
            .await
            .unwrap()
            .id
            .unwrap()
            .to_string()
    }

    async fn seed_product(db: &Surreal<Db>, name: &str, price: f64, stock: i64) -> String {
        ProductRepository::new(db.clone())
            .create(ProductCreate {
                name: name.to_string(),
                description: String::new(),
                price,
                category: None,
                stock_quantity: stock,
            })
            .await
            .unwrap()
            .id
            .unwrap()
            .to_string()
    }

    fn request(code: Option<&str>, points: Option<i64>) -> CheckoutRequest {
        CheckoutRequest {
            payment_method: PaymentMethod::Cod,
            shipping: ShippingRequest {
                name: "Alice".to_string(),
                address: "1 Main St".to_string(),
                phone: "555-0100".to_string(),
            },
            note: None,
            promotion_code: code.map(|c| c.to_string()),
            points,
        }
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let db = connect_memory().await;
        let service = setup(&db).await;
        let user = seed_user(&db, 0).await;

        let err = service.checkout(&user, request(None, None)).await.unwrap_err();
        assert_eq!(err.kind(), "EMPTY_CART");
    }

    #[tokio::test]
    async fn test_checkout_blank_shipping_rejected() {
        let db = connect_memory().await;
        let service = setup(&db).await;
        let user = seed_user(&db, 0).await;

        let mut req = request(None, None);
        req.shipping.phone = String::new();
        let err = service.checkout(&user, req).await.unwrap_err();
        assert_eq!(err.kind(), "INVALID_SHIPPING_INFO");
    }

    #[tokio::test]
    async fn test_checkout_happy_path() {
        let db = connect_memory().await;
        let service = setup(&db).await;
        let user = seed_user(&db, 0).await;
        let product = seed_product(&db, "Widget", 12.5, 10).await;

        CartRepository::new(db.clone())
            .add_item(&user, &product, 2)
            .await
            .unwrap();

        let order = service.checkout(&user, request(None, None)).await.unwrap();

        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.total_amount, 25.0);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].line_total, 25.0);
        assert_eq!(order.status_history.len(), 1);
        assert!(order.order_number.starts_with("ORD"));

        // Stock reserved, cart cleared
        let p = ProductRepository::new(db.clone())
            .find_by_id(&product)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(p.stock_quantity, 8);
        assert!(CartRepository::new(db).find_by_user(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_checkout_out_of_stock_restores_prior_lines() {
        let db = connect_memory().await;
        let service = setup(&db).await;
        let user = seed_user(&db, 0).await;
        let plenty = seed_product(&db, "Plenty", 5.0, 10).await;
        let scarce = seed_product(&db, "Scarce", 5.0, 1).await;

        let carts = CartRepository::new(db.clone());
        carts.add_item(&user, &plenty, 2).await.unwrap();
        carts.add_item(&user, &scarce, 3).await.unwrap();

        let err = service.checkout(&user, request(None, None)).await.unwrap_err();
        assert_eq!(err.kind(), "OUT_OF_STOCK");

        // Nothing reserved, cart untouched
        let products = ProductRepository::new(db.clone());
        assert_eq!(products.find_by_id(&plenty).await.unwrap().unwrap().stock_quantity, 10);
        assert_eq!(products.find_by_id(&scarce).await.unwrap().unwrap().stock_quantity, 1);
        assert!(carts.find_by_user(&user).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_checkout_failed_discount_restores_stock() {
        let db = connect_memory().await;
        let service = setup(&db).await;
        let user = seed_user(&db, 5).await;
        let product = seed_product(&db, "Widget", 10.0, 4).await;

        CartRepository::new(db.clone())
            .add_item(&user, &product, 2)
            .await
            .unwrap();

        // 5 points available, 50 requested
        let err = service.checkout(&user, request(None, Some(50))).await.unwrap_err();
        assert_eq!(err.kind(), "INSUFFICIENT_POINTS");

        let p = ProductRepository::new(db.clone())
            .find_by_id(&product)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(p.stock_quantity, 4);
        assert_eq!(
            UserRepository::new(db).get_points(&user).await.unwrap(),
            5
        );
    }

    #[tokio::test]
    async fn test_checkout_with_promotion_and_points() {
        let db = connect_memory().await;
        let service = setup(&db).await;
        let user = seed_user(&db, 20).await;
        let product = seed_product(&db, "Widget", 50.0, 10).await;

        CartRepository::new(db.clone())
            .add_item(&user, &product, 2)
            .await
            .unwrap();
        PromotionRepository::new(db.clone())
            .create(PromotionCreate {
                code: "TEN".to_string(),
                discount: 10.0,
                kind: PromotionKind::Percent,
                min_order_value: 0.0,
                expires_at: now_millis() + 60_000,
                user: None,
            })
            .await
            .unwrap();

        let order = service
            .checkout(&user, request(Some("TEN"), Some(20)))
            .await
            .unwrap();

        // 100 - 10% (10.0) - 20 points = 70
        assert_eq!(order.discount_amount, 30.0);
        assert_eq!(order.total_amount, 70.0);
        assert_eq!(UserRepository::new(db).get_points(&user).await.unwrap(), 0);
    }
}
