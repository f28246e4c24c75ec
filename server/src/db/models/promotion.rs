//! Promotion Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Discount kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromotionKind {
    /// `discount` is a percentage of the order total
    Percent,
    /// `discount` is a fixed currency amount
    Fixed,
}

/// Promotion / coupon
///
/// `user = None` 表示全局可重复使用的码；
/// `user = Some(..)` 表示单用户单次使用，成功应用后删除。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub code: String,
    /// Discount magnitude (percent value or fixed amount, per `kind`)
    pub discount: f64,
    pub kind: PromotionKind,
    #[serde(default)]
    pub min_order_value: f64,
    /// Unix millis; expired promotions never match
    pub expires_at: i64,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub user: Option<RecordId>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionCreate {
    pub code: String,
    pub discount: f64,
    pub kind: PromotionKind,
    #[serde(default)]
    pub min_order_value: f64,
    pub expires_at: i64,
    /// Owner user ID as "user:xxx" (None = global code)
    pub user: Option<String>,
}
