//! Favorites API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Favorite;
use crate::db::repository::{FavoriteRepository, ProductRepository};
use crate::utils::{AppError, AppResult};

/// POST /api/favorites/:product_id - 收藏商品
pub async fn add(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<Favorite>> {
    let products = ProductRepository::new(state.db.clone());
    if products.find_by_id(&product_id).await?.is_none() {
        return Err(AppError::not_found(format!(
            "Product {product_id} not found"
        )));
    }

    let repo = FavoriteRepository::new(state.db.clone());
    Ok(Json(repo.add(&user.id, &product_id).await?))
}

/// DELETE /api/favorites/:product_id - 取消收藏
pub async fn remove(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = FavoriteRepository::new(state.db.clone());
    Ok(Json(repo.remove(&user.id, &product_id).await?))
}

/// GET /api/favorites - 当前用户的收藏列表
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Favorite>>> {
    let repo = FavoriteRepository::new(state.db.clone());
    Ok(Json(repo.find_by_user(&user.id).await?))
}
