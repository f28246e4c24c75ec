//! Favorite Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Favorited product — at most one per (user, product)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub created_at: i64,
}
