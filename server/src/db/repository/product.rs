//! Product Repository
//!
//! Stock mutations are single conditional updates so a decrement can never
//! push `stock_quantity` below zero, no matter how many checkouts race.

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use crate::utils::now_millis;
use serde::Serialize;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub fn record_id(id: &str) -> RepoResult<RecordId> {
        parse_record_id(TABLE, id)
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(products)
    }

    pub async fn find_by_category(&self, category_id: &str) -> RepoResult<Vec<Product>> {
        // category is stored as a "category:id" string
        let cat = parse_record_id("category", category_id)?.to_string();
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE category = $cat ORDER BY created_at DESC")
            .bind(("cat", cat))
            .await?
            .take(0)?;
        Ok(products)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let rid = Self::record_id(id)?;
        let product: Option<Product> = self.base.db().select(rid).await?;
        Ok(product)
    }

    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        if data.price < 0.0 {
            return Err(RepoError::Validation("Price must be >= 0".to_string()));
        }
        if data.stock_quantity < 0 {
            return Err(RepoError::Validation("Stock must be >= 0".to_string()));
        }

        let category = match data.category {
            Some(ref id) => Some(parse_record_id("category", id)?),
            None => None,
        };

        let product = Product {
            id: None,
            name: data.name,
            description: data.description,
            price: data.price,
            category,
            stock_quantity: data.stock_quantity,
            purchase_count: 0,
            comment_count: 0,
            created_at: now_millis(),
        };

        let created: Option<Product> = self.base.db().create(TABLE).content(product).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Product> {
        if let Some(price) = data.price
            && price < 0.0
        {
            return Err(RepoError::Validation("Price must be >= 0".to_string()));
        }
        if let Some(stock) = data.stock_quantity
            && stock < 0
        {
            return Err(RepoError::Validation("Stock must be >= 0".to_string()));
        }

        #[derive(Serialize)]
        struct ProductUpdateDb {
            #[serde(skip_serializing_if = "Option::is_none")]
            name: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            price: Option<f64>,
            // Stored as a "category:id" string, like on create
            #[serde(skip_serializing_if = "Option::is_none")]
            category: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            stock_quantity: Option<i64>,
        }

        let update_data = ProductUpdateDb {
            name: data.name,
            description: data.description,
            price: data.price,
            category: match data.category {
                Some(ref id) => Some(parse_record_id("category", id)?.to_string()),
                None => None,
            },
            stock_quantity: data.stock_quantity,
        };

        let rid = Self::record_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing MERGE $data")
            .bind(("thing", rid))
            .bind(("data", update_data))
            .await?
            .check()?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let rid = Self::record_id(id)?;
        let deleted: Option<Product> = self.base.db().delete(rid).await?;
        Ok(deleted.is_some())
    }

    /// Atomic conditional stock reservation
    ///
    /// Decrements stock and bumps the purchase counter only when
    /// `stock_quantity >= qty`. Returns `false` when the condition fails
    /// (nothing is written).
    pub async fn try_reserve_stock(&self, product_id: &str, qty: i64) -> RepoResult<bool> {
        let rid = Self::record_id(product_id)?;
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $product SET stock_quantity -= $qty, purchase_count += $qty \
                 WHERE stock_quantity >= $qty RETURN AFTER",
            )
            .bind(("product", rid))
            .bind(("qty", qty))
            .await?;
        let updated: Vec<Product> = result.take(0)?;
        Ok(!updated.is_empty())
    }

    /// Unconditional stock restoration — the inverse of one reservation
    pub async fn restore_stock(&self, product_id: &str, qty: i64) -> RepoResult<()> {
        let rid = Self::record_id(product_id)?;
        self.base
            .db()
            .query("UPDATE $product SET stock_quantity += $qty, purchase_count -= $qty")
            .bind(("product", rid))
            .bind(("qty", qty))
            .await?
            .check()?;
        Ok(())
    }

    /// Up to five products sharing the category, excluding the product itself
    ///
    /// A product without a category has no similar products.
    pub async fn find_similar(&self, product_id: &str) -> RepoResult<Vec<Product>> {
        let product = self
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", product_id)))?;

        let Some(category) = product.category else {
            return Ok(Vec::new());
        };

        let rid = Self::record_id(product_id)?;
        let similar: Vec<Product> = self
            .base
            .db()
            .query(
                "SELECT * FROM product WHERE category = $cat AND id != $self \
                 ORDER BY created_at DESC LIMIT 5",
            )
            .bind(("cat", category.to_string()))
            .bind(("self", rid))
            .await?
            .take(0)?;
        Ok(similar)
    }

    /// Bump comment counter
    pub async fn increment_comment_count(&self, product_id: &str) -> RepoResult<()> {
        let rid = Self::record_id(product_id)?;
        self.base
            .db()
            .query("UPDATE $product SET comment_count += 1")
            .bind(("product", rid))
            .await?
            .check()?;
        Ok(())
    }
}
