//! Database Module
//!
//! Embedded SurrealDB (RocksDB engine) behind a repository layer.

pub mod models;
pub mod repository;

use crate::utils::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

const NAMESPACE: &str = "market";
const DATABASE: &str = "market";

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the embedded database at the given path
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        define_schema(&db)
            .await
            .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;

        tracing::info!("Database connection established (SurrealDB RocksDB at {db_path})");

        Ok(Self { db })
    }
}

/// Schema definitions — idempotent, applied at every startup
///
/// 表保持 SCHEMALESS，只定义唯一索引：
/// - user.email
/// - promotion (code, user)
/// - order.order_number
/// - cart.user
/// - favorite (user, product)
/// - viewed_product (user, product)
pub async fn define_schema(db: &Surreal<Db>) -> surrealdb::Result<()> {
    db.query(
        r#"
        DEFINE INDEX IF NOT EXISTS idx_user_email ON TABLE user COLUMNS email UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_promotion_code_user ON TABLE promotion COLUMNS code, user UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_order_number ON TABLE order COLUMNS order_number UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_cart_user ON TABLE cart COLUMNS user UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_favorite_user_product ON TABLE favorite COLUMNS user, product UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_viewed_user_product ON TABLE viewed_product COLUMNS user, product UNIQUE;
        "#,
    )
    .await?
    .check()?;
    Ok(())
}

/// In-memory database for tests
#[cfg(test)]
pub async fn connect_memory() -> Surreal<Db> {
    use surrealdb::engine::local::Mem;

    let db = Surreal::new::<Mem>(())
        .await
        .expect("Failed to start in-memory database");
    db.use_ns(NAMESPACE)
        .use_db(DATABASE)
        .await
        .expect("Failed to select namespace");
    define_schema(&db).await.expect("Failed to define schema");
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_on_disk_applies_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.db");

        let service = DbService::new(&path.to_string_lossy()).await.unwrap();

        // Schema DEFINEs are idempotent, re-running must not fail
        define_schema(&service.db).await.unwrap();
    }

    #[tokio::test]
    async fn test_unique_order_number_index_enforced() {
        let db = connect_memory().await;

        db.query("CREATE order SET order_number = 'ORD1', user = user:a")
            .await
            .unwrap()
            .check()
            .unwrap();
        let dup = db
            .query("CREATE order SET order_number = 'ORD1', user = user:b")
            .await
            .unwrap()
            .check();
        assert!(dup.is_err());
    }
}
