//! Notification Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// User notification — written fire-and-forget by the lifecycle manager
/// and the discount resolver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub message: String,
    /// "order" | "promotion" | "reward"
    pub category: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: i64,
}
