//! Promotion API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::{Promotion, PromotionCreate};
use crate::db::repository::PromotionRepository;
use crate::utils::AppResult;

/// GET /api/promotions - 当前有效的全局优惠码
pub async fn list_active(State(state): State<ServerState>) -> AppResult<Json<Vec<Promotion>>> {
    let repo = PromotionRepository::new(state.db.clone());
    Ok(Json(repo.find_active().await?))
}

/// POST /api/promotions - 创建优惠码 (管理员)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<PromotionCreate>,
) -> AppResult<Json<Promotion>> {
    let repo = PromotionRepository::new(state.db.clone());
    Ok(Json(repo.create(payload).await?))
}

/// DELETE /api/promotions/:id - 删除优惠码 (管理员)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = PromotionRepository::new(state.db.clone());
    Ok(Json(repo.delete(&id).await?))
}
