//! Order API 模块
//!
//! 结算入口 `POST /api/checkout` 与订单查询/取消/管理。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/checkout", post(handler::checkout))
        .nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    let admin = Router::new()
        .route("/{id}/status", put(handler::set_status))
        .route("/by-status/{status}", get(handler::list_by_status))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/", get(handler::list_own))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", post(handler::cancel))
        .merge(admin)
}
