//! Inventory Ledger
//!
//! 库存预留/回补。每行是一次原子条件更新；
//! 预留中途失败时，本次调用已预留的行全部回补后才返回错误。

use crate::db::repository::ProductRepository;
use crate::orders::error::{OrderError, OrderResult};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// One line to reserve or restore
#[derive(Debug, Clone)]
pub struct StockLine {
    /// Product ID as "product:xxx"
    pub product: String,
    pub quantity: i64,
}

#[derive(Clone)]
pub struct InventoryLedger {
    products: ProductRepository,
}

impl InventoryLedger {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            products: ProductRepository::new(db),
        }
    }

    /// Reserve stock for every line, all-or-nothing
    ///
    /// Each line is a single conditional decrement. On the first failing
    /// line, every line already reserved by this call is restored, then
    /// `OutOfStock` is returned for the failing line.
    pub async fn reserve(&self, lines: &[StockLine]) -> OrderResult<()> {
        let mut reserved: Vec<&StockLine> = Vec::with_capacity(lines.len());

        for line in lines {
            let ok = self
                .products
                .try_reserve_stock(&line.product, line.quantity)
                .await?;
            if ok {
                reserved.push(line);
                continue;
            }

            // Roll back what this call already took before reporting
            for taken in reserved {
                if let Err(e) = self
                    .products
                    .restore_stock(&taken.product, taken.quantity)
                    .await
                {
                    tracing::error!(
                        target: "inventory",
                        product = %taken.product,
                        quantity = taken.quantity,
                        error = %e,
                        "Failed to restore stock during reservation rollback"
                    );
                }
            }

            let available = self
                .products
                .find_by_id(&line.product)
                .await?
                .map(|p| p.stock_quantity)
                .unwrap_or(0);

            return Err(OrderError::OutOfStock {
                product: line.product.clone(),
                requested: line.quantity,
                available,
            });
        }

        Ok(())
    }

    /// Restore stock for every line — the inverse of exactly one `reserve`
    pub async fn restore(&self, lines: &[StockLine]) -> OrderResult<()> {
        for line in lines {
            self.products
                .restore_stock(&line.product, line.quantity)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::db::models::ProductCreate;

    async fn seed(db: &Surreal<Db>, name: &str, stock: i64) -> String {
        ProductRepository::new(db.clone())
            .create(ProductCreate {
                name: name.to_string(),
                description: String::new(),
                price: 1.0,
                category: None,
                stock_quantity: stock,
            })
            .await
            .unwrap()
            .id
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_partial_failure_restores_earlier_lines() {
        let db = connect_memory().await;
        let a = seed(&db, "A", 10).await;
        let b = seed(&db, "B", 1).await;
        let ledger = InventoryLedger::new(db.clone());

        let err = ledger
            .reserve(&[
                StockLine { product: a.clone(), quantity: 5 },
                StockLine { product: b.clone(), quantity: 3 },
            ])
            .await
            .unwrap_err();

        match err {
            OrderError::OutOfStock { product, requested, available } => {
                assert_eq!(product, b);
                assert_eq!(requested, 3);
                assert_eq!(available, 1);
            }
            other => panic!("expected OutOfStock, got {other:?}"),
        }

        // Line A must have been rolled back
        let products = ProductRepository::new(db);
        assert_eq!(products.find_by_id(&a).await.unwrap().unwrap().stock_quantity, 10);
        assert_eq!(products.find_by_id(&b).await.unwrap().unwrap().stock_quantity, 1);
    }

    #[tokio::test]
    async fn test_reserve_then_restore_roundtrip() {
        let db = connect_memory().await;
        let a = seed(&db, "A", 8).await;
        let ledger = InventoryLedger::new(db.clone());
        let lines = [StockLine { product: a.clone(), quantity: 3 }];

        ledger.reserve(&lines).await.unwrap();
        let products = ProductRepository::new(db.clone());
        let p = products.find_by_id(&a).await.unwrap().unwrap();
        assert_eq!(p.stock_quantity, 5);
        assert_eq!(p.purchase_count, 3);

        ledger.restore(&lines).await.unwrap();
        let p = products.find_by_id(&a).await.unwrap().unwrap();
        assert_eq!(p.stock_quantity, 8);
        assert_eq!(p.purchase_count, 0);
    }
}
