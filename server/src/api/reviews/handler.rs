//! Review API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Review;
use crate::reviews::RatedReviewOutcome;
use crate::utils::AppResult;

#[derive(Deserialize)]
pub struct CreateRatedRequest {
    pub product: String,
    pub rating: i32,
    pub comment: String,
}

/// POST /api/reviews - 提交评分评价 (随机奖励)
pub async fn create_rated(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateRatedRequest>,
) -> AppResult<Json<RatedReviewOutcome>> {
    let outcome = state
        .reviews
        .submit_rated(&user.id, &payload.product, payload.rating, payload.comment)
        .await?;
    Ok(Json(outcome))
}

/// GET /api/reviews/mine - 当前用户已评分的商品 ID 列表
pub async fn list_own_rated(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.reviews.rated_product_ids(&user.id).await?))
}

/// GET /api/reviews/product/:product_id - 商品的评分评价
pub async fn list_rated(
    State(state): State<ServerState>,
    Path(product_id): Path<String>,
) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(state.reviews.list_rated(&product_id).await?))
}

#[derive(Deserialize)]
pub struct AddCommentRequest {
    pub comment: String,
}

/// POST /api/reviews/product/:product_id/comments - 添加留言
pub async fn add_comment(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<String>,
    Json(payload): Json<AddCommentRequest>,
) -> AppResult<Json<Review>> {
    let review = state
        .reviews
        .add_comment(&user.id, &product_id, payload.comment)
        .await?;
    Ok(Json(review))
}

/// GET /api/reviews/product/:product_id/comments - 商品留言列表
pub async fn list_comments(
    State(state): State<ServerState>,
    Path(product_id): Path<String>,
) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(state.reviews.list_comments(&product_id).await?))
}
