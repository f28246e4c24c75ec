//! Discount Resolver
//!
//! 结算时的折扣解析：促销码 + 积分，按顺序叠加。
//! 所有校验先于任何变更；变更本身是原子条件更新，
//! 输掉竞争的一方得到与首次无效请求相同的错误。

use crate::db::models::PromotionKind;
use crate::db::repository::{PromotionRepository, UserRepository};
use crate::orders::error::{OrderError, OrderResult};
use crate::pricing::money;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// Where the discount came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountSource {
    None,
    Promotion,
    Points,
    PromotionAndPoints,
}

/// Outcome of discount resolution
#[derive(Debug, Clone, serde::Serialize)]
pub struct Resolution {
    /// `max(0, order_total - discount_amount)`
    pub final_amount: f64,
    pub discount_amount: f64,
    pub applied_code: Option<String>,
    pub points_used: i64,
    pub source: DiscountSource,
}

impl Resolution {
    fn zero(order_total: f64) -> Self {
        Self {
            final_amount: order_total,
            discount_amount: 0.0,
            applied_code: None,
            points_used: 0,
            source: DiscountSource::None,
        }
    }
}

/// Resolves promotion codes and loyalty points against an order total
#[derive(Clone)]
pub struct DiscountResolver {
    promotions: PromotionRepository,
    users: UserRepository,
}

impl DiscountResolver {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            promotions: PromotionRepository::new(db.clone()),
            users: UserRepository::new(db),
        }
    }

    /// Resolve and apply discounts for a checkout
    ///
    /// Validation of both inputs happens before any mutation. The mutations
    /// (point debit, single-use promotion consumption) are atomic conditional
    /// updates; losing the promotion race after the points were debited
    /// refunds the points before returning the error.
    pub async fn resolve(
        &self,
        order_total: f64,
        code: Option<&str>,
        points: Option<i64>,
        user_id: &str,
    ) -> OrderResult<Resolution> {
        let points = points.unwrap_or(0);
        if points < 0 {
            return Err(OrderError::Validation("Points must be >= 0".to_string()));
        }
        if code.is_none() && points == 0 {
            return Ok(Resolution::zero(order_total));
        }

        // ---- Validation phase: no writes yet ----
        let promotion = match code {
            Some(code) => {
                let promo = self
                    .promotions
                    .find_applicable(code, user_id)
                    .await?
                    .ok_or(OrderError::InvalidOrExpiredPromotion)?;
                if order_total < promo.min_order_value {
                    return Err(OrderError::MinimumOrderNotMet {
                        minimum: promo.min_order_value,
                    });
                }
                Some(promo)
            }
            None => None,
        };

        if points > 0 {
            let available = self.users.get_points(user_id).await?;
            if available < points {
                return Err(OrderError::InsufficientPoints {
                    requested: points,
                    available,
                });
            }
        }

        // ---- Mutation phase: atomic conditional updates ----
        if points > 0 && !self.users.try_debit_points(user_id, points).await? {
            // A concurrent debit won between validation and here
            let available = self.users.get_points(user_id).await.unwrap_or(0);
            return Err(OrderError::InsufficientPoints {
                requested: points,
                available,
            });
        }

        let promo_discount = match &promotion {
            Some(promo) => {
                // Global codes are reusable; user-scoped codes are consumed
                // exactly once, and the race loser gets the same error as an
                // invalid code.
                if promo.user.is_some() {
                    let id = promo
                        .id
                        .clone()
                        .ok_or_else(|| OrderError::Database("Promotion without id".to_string()))?;
                    if !self.promotions.consume(&id).await? {
                        if points > 0 {
                            self.users.credit_points(user_id, points).await?;
                        }
                        return Err(OrderError::InvalidOrExpiredPromotion);
                    }
                }

                match promo.kind {
                    PromotionKind::Percent => money::percent_of(order_total, promo.discount),
                    PromotionKind::Fixed => promo.discount,
                }
            }
            None => 0.0,
        };

        // 1 point = 1 currency unit
        let discount_amount =
            money::to_f64(money::to_decimal(promo_discount) + rust_decimal::Decimal::from(points));
        let final_amount = money::subtract_clamped(order_total, discount_amount);

        let source = match (&promotion, points > 0) {
            (Some(_), true) => DiscountSource::PromotionAndPoints,
            (Some(_), false) => DiscountSource::Promotion,
            (None, true) => DiscountSource::Points,
            (None, false) => DiscountSource::None,
        };

        Ok(Resolution {
            final_amount,
            discount_amount,
            applied_code: promotion.map(|p| p.code),
            points_used: points,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::db::models::{PromotionCreate, User};
    use crate::utils::now_millis;

    async fn seed_user(db: &Surreal<Db>, points: i64) -> String {
        let users = UserRepository::new(db.clone());
        let mut user = User::new("Test".to_string(), "t@example.com".to_string(), now_millis());
        user.points = points;
        users.create(user).await.unwrap().id.unwrap().to_string()
    }

    fn promo(code: &str, kind: PromotionKind, discount: f64, min: f64, user: Option<&str>) -> PromotionCreate {
        PromotionCreate {
            code: code.to_string(),
            discount,
            kind,
            min_order_value: min,
            expires_at: now_millis() + 60_000,
            user: user.map(|u| u.to_string()),
        }
    }

    #[tokio::test]
    async fn test_no_inputs_is_zero_discount() {
        let db = connect_memory().await;
        let user = seed_user(&db, 0).await;
        let resolver = DiscountResolver::new(db);

        let r = resolver.resolve(50.0, None, None, &user).await.unwrap();
        assert_eq!(r.final_amount, 50.0);
        assert_eq!(r.discount_amount, 0.0);
        assert_eq!(r.source, DiscountSource::None);
    }

    #[tokio::test]
    async fn test_percent_promotion_uses_decimal_math() {
        let db = connect_memory().await;
        let user = seed_user(&db, 0).await;
        PromotionRepository::new(db.clone())
            .create(promo("TEN", PromotionKind::Percent, 10.0, 0.0, None))
            .await
            .unwrap();
        let resolver = DiscountResolver::new(db);

        let r = resolver.resolve(33.33, Some("TEN"), None, &user).await.unwrap();
        assert_eq!(r.discount_amount, 3.33);
        assert_eq!(r.final_amount, 30.0);
        assert_eq!(r.applied_code.as_deref(), Some("TEN"));
        assert_eq!(r.source, DiscountSource::Promotion);
    }

    #[tokio::test]
    async fn test_minimum_order_not_met() {
        let db = connect_memory().await;
        let user = seed_user(&db, 0).await;
        PromotionRepository::new(db.clone())
            .create(promo("BIG", PromotionKind::Fixed, 20.0, 100.0, None))
            .await
            .unwrap();
        let resolver = DiscountResolver::new(db);

        let err = resolver.resolve(50.0, Some("BIG"), None, &user).await.unwrap_err();
        assert_eq!(err.kind(), "MINIMUM_ORDER_NOT_MET");
    }

    #[tokio::test]
    async fn test_unknown_code() {
        let db = connect_memory().await;
        let user = seed_user(&db, 0).await;
        let resolver = DiscountResolver::new(db);

        let err = resolver.resolve(50.0, Some("NOPE"), None, &user).await.unwrap_err();
        assert_eq!(err.kind(), "INVALID_OR_EXPIRED_PROMOTION");
    }

    #[tokio::test]
    async fn test_points_debited_and_discount_clamped() {
        let db = connect_memory().await;
        let user = seed_user(&db, 100).await;
        let resolver = DiscountResolver::new(db.clone());

        let r = resolver.resolve(60.0, None, Some(80), &user).await.unwrap();
        assert_eq!(r.points_used, 80);
        assert_eq!(r.discount_amount, 80.0);
        assert_eq!(r.final_amount, 0.0); // clamped, never negative
        assert_eq!(r.source, DiscountSource::Points);

        let balance = UserRepository::new(db).get_points(&user).await.unwrap();
        assert_eq!(balance, 20);
    }

    #[tokio::test]
    async fn test_negative_points_rejected_before_any_mutation() {
        let db = connect_memory().await;
        let user = seed_user(&db, 10).await;
        let resolver = DiscountResolver::new(db.clone());

        let err = resolver.resolve(60.0, None, Some(-5), &user).await.unwrap_err();
        assert_eq!(err.kind(), "VALIDATION");

        let balance = UserRepository::new(db).get_points(&user).await.unwrap();
        assert_eq!(balance, 10);
    }

    #[tokio::test]
    async fn test_insufficient_points_leaves_balance_untouched() {
        let db = connect_memory().await;
        let user = seed_user(&db, 10).await;
        let resolver = DiscountResolver::new(db.clone());

        let err = resolver.resolve(60.0, None, Some(50), &user).await.unwrap_err();
        assert_eq!(err.kind(), "INSUFFICIENT_POINTS");

        let balance = UserRepository::new(db).get_points(&user).await.unwrap();
        assert_eq!(balance, 10);
    }

    #[tokio::test]
    async fn test_user_scoped_code_consumed_once() {
        let db = connect_memory().await;
        let user = seed_user(&db, 0).await;
        PromotionRepository::new(db.clone())
            .create(promo("ONCE", PromotionKind::Fixed, 5.0, 0.0, Some(&user)))
            .await
            .unwrap();
        let resolver = DiscountResolver::new(db);

        let first = resolver.resolve(50.0, Some("ONCE"), None, &user).await.unwrap();
        assert_eq!(first.discount_amount, 5.0);

        let second = resolver.resolve(50.0, Some("ONCE"), None, &user).await.unwrap_err();
        assert_eq!(second.kind(), "INVALID_OR_EXPIRED_PROMOTION");
    }

    #[tokio::test]
    async fn test_promotion_and_points_stack() {
        let db = connect_memory().await;
        let user = seed_user(&db, 30).await;
        PromotionRepository::new(db.clone())
            .create(promo("TEN", PromotionKind::Percent, 10.0, 0.0, None))
            .await
            .unwrap();
        let resolver = DiscountResolver::new(db);

        let r = resolver
            .resolve(100.0, Some("TEN"), Some(20), &user)
            .await
            .unwrap();
        assert_eq!(r.discount_amount, 30.0); // 10.0 promo + 20 points
        assert_eq!(r.final_amount, 70.0);
        assert_eq!(r.source, DiscountSource::PromotionAndPoints);
    }
}
