//! Review Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Product review or comment
///
/// `rating = Some(..)` 是评分评价 (要求已送达订单，每用户每商品一条，有奖励)；
/// `rating = None` 是普通评论，不限数量。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    /// 1..=5 for rated reviews, None for plain comments
    pub rating: Option<i32>,
    pub comment: String,
    pub created_at: i64,
}
