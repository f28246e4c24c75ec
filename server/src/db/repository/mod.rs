//! Repository Module
//!
//! Provides CRUD and atomic conditional updates for SurrealDB tables.

pub mod cart;
pub mod category;
pub mod favorite;
pub mod notification;
pub mod order;
pub mod product;
pub mod promotion;
pub mod review;
pub mod user;
pub mod viewed_product;

pub use cart::CartRepository;
pub use category::CategoryRepository;
pub use favorite::FavoriteRepository;
pub use notification::NotificationRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use promotion::PromotionRepository;
pub use review::ReviewRepository;
pub use user::UserRepository;
pub use viewed_product::ViewedProductRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全栈统一使用 "table:id" 格式
// =============================================================================
//
// 使用 surrealdb::RecordId 处理所有 ID：
//   - 解析: let id: RecordId = "product:abc".parse()?;
//   - 创建: let id = RecordId::from_table_key("product", "abc");
//   - CRUD: db.select(id) / db.delete(id) 直接使用 RecordId

/// Parse "table:id" (or a bare key) into a RecordId for the given table
pub fn parse_record_id(table: &str, id: &str) -> RepoResult<surrealdb::RecordId> {
    if let Some(key) = id.strip_prefix(&format!("{table}:")) {
        Ok(surrealdb::RecordId::from_table_key(table, key))
    } else if id.contains(':') {
        Err(RepoError::Validation(format!(
            "Expected {table} ID, got: {id}"
        )))
    } else {
        Ok(surrealdb::RecordId::from_table_key(table, id))
    }
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_id_accepts_both_forms() {
        let a = parse_record_id("product", "product:abc").unwrap();
        let b = parse_record_id("product", "abc").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.table(), "product");
    }

    #[test]
    fn test_parse_record_id_rejects_wrong_table() {
        assert!(parse_record_id("product", "user:abc").is_err());
    }
}
