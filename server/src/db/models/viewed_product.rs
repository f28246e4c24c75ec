//! Viewed Product Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Recently-viewed marker — one per (user, product), `viewed_at` bumped on
/// every repeat view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewedProduct {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub viewed_at: i64,
}
