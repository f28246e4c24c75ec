//! Server Implementation
//!
//! HTTP 服务器启动和管理

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::auth::require_auth;
use crate::core::{BackgroundTasks, Config, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn new(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    /// Build the application router for the given state
    pub fn build_router(state: ServerState) -> Router {
        Router::new()
            .merge(api::health::router())
            .merge(api::products::router())
            .merge(api::categories::router())
            .merge(api::cart::router())
            .merge(api::favorites::router())
            .merge(api::orders::router())
            .merge(api::promotions::router())
            .merge(api::reviews::router())
            .merge(api::notifications::router())
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                require_auth,
            ))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let mut tasks = BackgroundTasks::new();
        self.state.start_background_tasks(&mut tasks);

        let app = Self::build_router(self.state.clone());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!("Market server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await
            .context("HTTP server failed")?;

        tasks.shutdown().await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::{Request, StatusCode, header};
    use tower::ServiceExt;

    async fn request(router: Router, req: Request<Body>) -> StatusCode {
        router.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = Server::build_router(ServerState::for_tests().await);
        let req = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request(app, req).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_product_browsing_is_public() {
        let app = Server::build_router(ServerState::for_tests().await);
        let req = Request::builder()
            .uri("/api/products")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request(app, req).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_rejects_missing_token() {
        let app = Server::build_router(ServerState::for_tests().await);
        let req = Request::builder()
            .uri("/api/orders")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request(app, req).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let state = ServerState::for_tests().await;
        let token = state
            .jwt_service
            .generate_token("user:alice", "alice@example.com", "customer")
            .unwrap();
        let app = Server::build_router(state);

        let req = Request::builder()
            .uri("/api/orders")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(request(app, req).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_route_rejects_customer() {
        let state = ServerState::for_tests().await;
        let token = state
            .jwt_service
            .generate_token("user:alice", "alice@example.com", "customer")
            .unwrap();
        let app = Server::build_router(state);

        let req = Request::builder()
            .method("DELETE")
            .uri("/api/products/product:p1")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(request(app, req).await, StatusCode::FORBIDDEN);
    }
}
