//! Review Domain
//!
//! 评分评价与普通留言共用一张表 (rating 为空即留言)。
//! 评分评价要求该用户有包含此商品的 DELIVERED 订单，且每 (用户, 商品)
//! 至多一条；成功提交后随机发放奖励：专属优惠券或积分，二选一。

use crate::db::models::{Promotion, PromotionKind, Review};
use crate::db::repository::{
    OrderRepository, ProductRepository, PromotionRepository, ReviewRepository, UserRepository,
};
use crate::notify::NotificationService;
use crate::utils::{AppError, AppResult, now_millis};
use rand::Rng;
use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// Reward coupon: user-scoped 10 % off, valid 7 days
const COUPON_DISCOUNT_PERCENT: f64 = 10.0;
const COUPON_VALIDITY_DAYS: i64 = 7;
/// Reward points alternative
const REWARD_POINTS: i64 = 50;

/// What a rated review earned the reviewer
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewReward {
    Coupon { code: String, expires_at: i64 },
    Points { amount: i64 },
}

/// Rated review plus the reward it produced
#[derive(Debug, Serialize)]
pub struct RatedReviewOutcome {
    pub review: Review,
    pub reward: ReviewReward,
}

#[derive(Clone)]
pub struct ReviewService {
    reviews: ReviewRepository,
    orders: OrderRepository,
    products: ProductRepository,
    promotions: PromotionRepository,
    users: UserRepository,
    notify: NotificationService,
}

impl ReviewService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            reviews: ReviewRepository::new(db.clone()),
            orders: OrderRepository::new(db.clone()),
            products: ProductRepository::new(db.clone()),
            promotions: PromotionRepository::new(db.clone()),
            users: UserRepository::new(db.clone()),
            notify: NotificationService::new(db),
        }
    }

    /// Submit a rated review and hand out the randomized reward
    pub async fn submit_rated(
        &self,
        user_id: &str,
        product_id: &str,
        rating: i32,
        comment: String,
    ) -> AppResult<RatedReviewOutcome> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::validation("Rating must be between 1 and 5"));
        }

        if self
            .products
            .find_by_id(product_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found(format!("Product {product_id} not found")));
        }

        if !self.orders.has_delivered_product(user_id, product_id).await? {
            return Err(AppError::forbidden(
                "Only customers with a delivered order can rate this product",
            ));
        }
        if self.reviews.has_rated(user_id, product_id).await? {
            return Err(AppError::Conflict(
                "Product already rated by this user".to_string(),
            ));
        }

        let now = now_millis();
        let review = self
            .reviews
            .create(Review {
                id: None,
                user: crate::db::repository::parse_record_id("user", user_id)?,
                product: crate::db::repository::parse_record_id("product", product_id)?,
                rating: Some(rating),
                comment,
                created_at: now,
            })
            .await?;

        self.products.increment_comment_count(product_id).await?;
        let reward = self.grant_reward(user_id, now).await?;

        let message = match &reward {
            ReviewReward::Coupon { code, .. } => {
                format!("Thanks for your review! Coupon {code} has been added to your account")
            }
            ReviewReward::Points { amount } => {
                format!("Thanks for your review! {amount} points have been added to your account")
            }
        };
        self.notify.publish(user_id, &message, "reward").await;

        Ok(RatedReviewOutcome { review, reward })
    }

    /// Add a plain comment (no rating, no reward, no purchase required)
    pub async fn add_comment(
        &self,
        user_id: &str,
        product_id: &str,
        comment: String,
    ) -> AppResult<Review> {
        if comment.trim().is_empty() {
            return Err(AppError::validation("Comment cannot be empty"));
        }
        if self.products.find_by_id(product_id).await?.is_none() {
            return Err(AppError::not_found(format!("Product {product_id} not found")));
        }

        let review = self
            .reviews
            .create(Review {
                id: None,
                user: crate::db::repository::parse_record_id("user", user_id)?,
                product: crate::db::repository::parse_record_id("product", product_id)?,
                rating: None,
                comment,
                created_at: now_millis(),
            })
            .await?;
        self.products.increment_comment_count(product_id).await?;
        Ok(review)
    }

    pub async fn list_rated(&self, product_id: &str) -> AppResult<Vec<Review>> {
        Ok(self.reviews.find_rated_by_product(product_id).await?)
    }

    pub async fn list_comments(&self, product_id: &str) -> AppResult<Vec<Review>> {
        Ok(self.reviews.find_comments_by_product(product_id).await?)
    }

    /// Product IDs the user has already rated
    pub async fn rated_product_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        Ok(self.reviews.rated_product_ids(user_id).await?)
    }

    /// Coin flip: user-scoped coupon or loyalty points, never both
    async fn grant_reward(&self, user_id: &str, now: i64) -> AppResult<ReviewReward> {
        let coupon = rand::thread_rng().gen_bool(0.5);
        if coupon {
            let expires_at = now + COUPON_VALIDITY_DAYS * 24 * 60 * 60 * 1_000;
            let promo = self.create_reward_coupon(user_id, now, expires_at).await?;
            Ok(ReviewReward::Coupon {
                code: promo.code,
                expires_at,
            })
        } else {
            self.users.credit_points(user_id, REWARD_POINTS).await?;
            Ok(ReviewReward::Points {
                amount: REWARD_POINTS,
            })
        }
    }

    async fn create_reward_coupon(
        &self,
        user_id: &str,
        now: i64,
        expires_at: i64,
    ) -> AppResult<Promotion> {
        let promo = self
            .promotions
            .create(crate::db::models::PromotionCreate {
                code: format!("REVIEW{now}"),
                discount: COUPON_DISCOUNT_PERCENT,
                kind: PromotionKind::Percent,
                min_order_value: 0.0,
                expires_at,
                user: Some(user_id.to_string()),
            })
            .await?;
        Ok(promo)
    }
}
