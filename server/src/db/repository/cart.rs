//! Cart Repository
//!
//! One cart per user, keyed by the unique `cart.user` index.

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Cart, CartItem};
use crate::utils::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "cart";

#[derive(Clone)]
pub struct CartRepository {
    base: BaseRepository,
}

impl CartRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_user(&self, user_id: &str) -> RepoResult<Option<Cart>> {
        // Reference fields are stored as "table:id" strings
        let user = parse_record_id("user", user_id)?.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM cart WHERE user = $user LIMIT 1")
            .bind(("user", user))
            .await?;
        let carts: Vec<Cart> = result.take(0)?;
        Ok(carts.into_iter().next())
    }

    /// Add (or merge) an item into the user's cart, creating the cart on
    /// first use
    pub async fn add_item(&self, user_id: &str, product_id: &str, qty: i64) -> RepoResult<Cart> {
        if qty <= 0 {
            return Err(RepoError::Validation("Quantity must be > 0".to_string()));
        }
        let product = parse_record_id("product", product_id)?;

        let mut cart = match self.find_by_user(user_id).await? {
            Some(cart) => cart,
            None => Cart {
                id: None,
                user: parse_record_id("user", user_id)?,
                items: Vec::new(),
                updated_at: now_millis(),
            },
        };

        match cart.items.iter_mut().find(|i| i.product == product) {
            Some(item) => item.quantity += qty,
            None => cart.items.push(CartItem {
                product,
                quantity: qty,
            }),
        }
        cart.updated_at = now_millis();

        self.save(cart).await
    }

    /// Remove a product line entirely
    pub async fn remove_item(&self, user_id: &str, product_id: &str) -> RepoResult<Cart> {
        let product = parse_record_id("product", product_id)?;
        let mut cart = self
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Cart for {} not found", user_id)))?;

        cart.items.retain(|i| i.product != product);
        cart.updated_at = now_millis();

        self.save(cart).await
    }

    /// Delete the user's cart (after successful checkout)
    pub async fn clear(&self, user_id: &str) -> RepoResult<()> {
        let user = parse_record_id("user", user_id)?.to_string();
        self.base
            .db()
            .query("DELETE cart WHERE user = $user")
            .bind(("user", user))
            .await?
            .check()?;
        Ok(())
    }

    async fn save(&self, mut cart: Cart) -> RepoResult<Cart> {
        // The id never goes into the content payload, it is the write target
        match cart.id.take() {
            Some(id) => {
                let updated: Option<Cart> = self.base.db().update(id).content(cart).await?;
                updated.ok_or_else(|| RepoError::Database("Failed to update cart".to_string()))
            }
            None => {
                let created: Option<Cart> = self.base.db().create(TABLE).content(cart).await?;
                created.ok_or_else(|| RepoError::Database("Failed to create cart".to_string()))
            }
        }
    }
}
