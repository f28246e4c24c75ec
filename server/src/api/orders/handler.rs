//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, OrderStatus};
use crate::db::repository::OrderRepository;
use crate::orders::{CheckoutRequest, OrderError, OrderResult};

/// POST /api/checkout - 结算当前用户购物车
pub async fn checkout(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CheckoutRequest>,
) -> OrderResult<Json<Order>> {
    let order = state.orders.checkout(&user.id, payload).await?;
    Ok(Json(order))
}

/// GET /api/orders - 当前用户订单列表
pub async fn list_own(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> OrderResult<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    Ok(Json(repo.find_by_user(&user.id).await?))
}

/// GET /api/orders/:id - 获取单个订单 (仅限本人，管理员除外)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> OrderResult<Json<Order>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| OrderError::NotFound(format!("Order {id} not found")))?;

    if order.user.to_string() != user.id && !user.is_admin() {
        return Err(OrderError::Forbidden);
    }
    Ok(Json(order))
}

/// POST /api/orders/:id/cancel - 用户取消订单
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> OrderResult<Json<Order>> {
    let order = state.orders.request_cancellation(&id, &user.id).await?;
    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
    pub note: Option<String>,
}

/// PUT /api/orders/:id/status - 管理员变更订单状态
pub async fn set_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<SetStatusRequest>,
) -> OrderResult<Json<Order>> {
    let order = state
        .orders
        .admin_set_status(&id, &payload.status, payload.note)
        .await?;
    Ok(Json(order))
}

/// GET /api/orders/by-status/:status - 管理员按状态查询
pub async fn list_by_status(
    State(state): State<ServerState>,
    Path(status): Path<String>,
) -> OrderResult<Json<Vec<Order>>> {
    let status =
        OrderStatus::parse(&status).ok_or_else(|| OrderError::InvalidStatus(status.clone()))?;
    let repo = OrderRepository::new(state.db.clone());
    Ok(Json(repo.find_by_status(status).await?))
}
