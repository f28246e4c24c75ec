//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate, ProductUpdate, ViewedProduct};
use crate::db::repository::{ProductRepository, ViewedProductRepository};
use crate::utils::{AppError, AppResult, now_millis};

#[derive(Deserialize)]
pub struct ListQuery {
    /// Optional category filter ("category:xxx" or bare key)
    pub category: Option<String>,
}

/// GET /api/products - 获取商品列表 (可按分类过滤)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.db.clone());
    let products = match query.category {
        Some(ref category) => repo.find_by_category(category).await?,
        None => repo.find_all().await?,
    };
    Ok(Json(products))
}

/// GET /api/products/:id - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;
    Ok(Json(product))
}

/// GET /api/products/:id/similar - 同分类的相似商品
pub async fn list_similar(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.db.clone());
    Ok(Json(repo.find_similar(&id).await?))
}

/// POST /api/products/:id/viewed - 记录浏览
pub async fn record_view(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let products = ProductRepository::new(state.db.clone());
    if products.find_by_id(&id).await?.is_none() {
        return Err(AppError::not_found(format!("Product {id} not found")));
    }

    let viewed = ViewedProductRepository::new(state.db.clone());
    viewed.record(&user.id, &id, now_millis()).await?;
    Ok(Json(true))
}

/// GET /api/products/viewed - 当前用户最近浏览
pub async fn list_viewed(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<ViewedProduct>>> {
    let repo = ViewedProductRepository::new(state.db.clone());
    Ok(Json(repo.find_recent_by_user(&user.id).await?))
}

/// POST /api/products - 创建商品 (管理员)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    Ok(Json(repo.create(payload).await?))
}

/// PUT /api/products/:id - 更新商品 (管理员)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    Ok(Json(repo.update(&id, payload).await?))
}

/// DELETE /api/products/:id - 删除商品 (管理员)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = ProductRepository::new(state.db.clone());
    Ok(Json(repo.delete(&id).await?))
}
