//! Review API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reviews", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create_rated))
        .route("/mine", get(handler::list_own_rated))
        .route("/product/{product_id}", get(handler::list_rated))
        .route(
            "/product/{product_id}/comments",
            get(handler::list_comments).post(handler::add_comment),
        )
}
