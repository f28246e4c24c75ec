//! User Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// User account
///
/// Credentials live in the external identity service; this table only holds
/// profile data and the loyalty point balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    pub email: String,
    /// Loyalty points, 1 point = 1 currency unit. Never negative.
    #[serde(default)]
    pub points: i64,
    pub address: Option<String>,
    /// "customer" | "admin"
    #[serde(default = "default_role")]
    pub role: String,
    pub created_at: i64,
}

fn default_role() -> String {
    "customer".to_string()
}

impl User {
    pub fn new(name: String, email: String, created_at: i64) -> Self {
        Self {
            id: None,
            name,
            email,
            points: 0,
            address: None,
            role: "customer".to_string(),
            created_at,
        }
    }
}
