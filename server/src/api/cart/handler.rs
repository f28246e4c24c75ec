//! Cart API Handlers
//!
//! 加购时校验商品存在且库存足够；真正的扣减发生在结算时，
//! 这里的检查只是尽早反馈。

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Cart;
use crate::db::repository::{CartRepository, ProductRepository};
use crate::utils::{AppError, AppResult};

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product: String,
    pub quantity: i64,
}

/// GET /api/cart - 获取当前用户购物车
pub async fn get_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Cart>> {
    let repo = CartRepository::new(state.db.clone());
    let cart = repo.find_by_user(&user.id).await?.unwrap_or(Cart {
        id: None,
        user: crate::db::repository::parse_record_id("user", &user.id)?,
        items: Vec::new(),
        updated_at: crate::utils::now_millis(),
    });
    Ok(Json(cart))
}

/// POST /api/cart/items - 加入商品
pub async fn add_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<Json<Cart>> {
    if payload.quantity <= 0 {
        return Err(AppError::validation("Quantity must be > 0"));
    }

    let products = ProductRepository::new(state.db.clone());
    let product = products
        .find_by_id(&payload.product)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", payload.product)))?;
    if product.stock_quantity < payload.quantity {
        return Err(AppError::validation(format!(
            "Only {} in stock",
            product.stock_quantity
        )));
    }

    let carts = CartRepository::new(state.db.clone());
    Ok(Json(
        carts
            .add_item(&user.id, &payload.product, payload.quantity)
            .await?,
    ))
}

/// DELETE /api/cart/items/:product_id - 移除商品
pub async fn remove_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<Cart>> {
    let carts = CartRepository::new(state.db.clone());
    Ok(Json(carts.remove_item(&user.id, &product_id).await?))
}
