//! Order Model
//!
//! 订单是纯追加的：永不物理删除，状态历史只增不减，
//! 最后一条历史永远等于当前状态。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use std::fmt;
use surrealdb::RecordId;

/// Order status state machine
///
/// ```text
/// NEW → CONFIRMED → PREPARING → DELIVERING → DELIVERED (terminal)
///  │                    │
///  │ (≤ window)         └→ CANCEL_REQUESTED → CANCELED (terminal)
///  └──────────────────────────────────────────↑
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Confirmed,
    Preparing,
    Delivering,
    Delivered,
    CancelRequested,
    Canceled,
}

impl OrderStatus {
    /// Parse a status string, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "NEW" => Some(Self::New),
            "CONFIRMED" => Some(Self::Confirmed),
            "PREPARING" => Some(Self::Preparing),
            "DELIVERING" => Some(Self::Delivering),
            "DELIVERED" => Some(Self::Delivered),
            "CANCEL_REQUESTED" => Some(Self::CancelRequested),
            "CANCELED" => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Confirmed => "CONFIRMED",
            Self::Preparing => "PREPARING",
            Self::Delivering => "DELIVERING",
            Self::Delivered => "DELIVERED",
            Self::CancelRequested => "CANCEL_REQUESTED",
            Self::Canceled => "CANCELED",
        }
    }

    /// Terminal states accept no further transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Canceled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cod,
    Wallet,
}

/// Order line item — snapshot of the product at checkout time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub line_total: f64,
}

/// Shipping contact — all fields required at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Append-only status history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub timestamp: i64,
    pub note: Option<String>,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Human-readable unique number: ORD<yyyymmdd><counter>
    pub order_number: String,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub items: Vec<LineItem>,
    /// Post-discount total, never negative
    pub total_amount: f64,
    #[serde(default)]
    pub discount_amount: f64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub status_history: Vec<StatusHistoryEntry>,
    pub shipping: ShippingInfo,
    pub note: Option<String>,
    pub created_at: i64,
    /// Set exactly once, when the order reaches DELIVERED
    pub delivered_at: Option<i64>,
}
