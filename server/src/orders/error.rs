//! Order Domain Errors
//!
//! 每个错误携带一个稳定的机器可读 kind (SCREAMING_SNAKE)，
//! 作为 API 响应的 `code` 字段。HTTP 状态码只是辅助信号。

use crate::db::models::OrderStatus;
use crate::db::repository::RepoError;
use crate::utils::AppResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Order/checkout domain error taxonomy
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    OutOfStock {
        product: String,
        requested: i64,
        available: i64,
    },

    #[error("Shipping name, address and phone are required")]
    InvalidShippingInfo,

    #[error("Promotion code is invalid or expired")]
    InvalidOrExpiredPromotion,

    #[error("Order total below the promotion minimum of {minimum}")]
    MinimumOrderNotMet { minimum: f64 },

    #[error("Insufficient loyalty points: requested {requested}, available {available}")]
    InsufficientPoints { requested: i64, available: i64 },

    #[error("Not allowed to act on this order")]
    Forbidden,

    #[error("Cancellation window closed (status {status}, {elapsed_minutes} minutes elapsed)")]
    CancellationWindowClosed {
        status: OrderStatus,
        elapsed_minutes: i64,
    },

    #[error("Order already in terminal status")]
    OrderAlreadyTerminal,

    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl OrderError {
    /// Stable machine-readable kind — the authoritative error signal
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyCart => "EMPTY_CART",
            Self::OutOfStock { .. } => "OUT_OF_STOCK",
            Self::InvalidShippingInfo => "INVALID_SHIPPING_INFO",
            Self::InvalidOrExpiredPromotion => "INVALID_OR_EXPIRED_PROMOTION",
            Self::MinimumOrderNotMet { .. } => "MINIMUM_ORDER_NOT_MET",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::Forbidden => "FORBIDDEN",
            Self::CancellationWindowClosed { .. } => "CANCELLATION_WINDOW_CLOSED",
            Self::OrderAlreadyTerminal => "ORDER_ALREADY_TERMINAL",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::Validation(_) => "VALIDATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyCart
            | Self::OutOfStock { .. }
            | Self::InvalidShippingInfo
            | Self::InvalidOrExpiredPromotion
            | Self::MinimumOrderNotMet { .. }
            | Self::InsufficientPoints { .. }
            | Self::InvalidStatus(_)
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::CancellationWindowClosed { .. } | Self::OrderAlreadyTerminal => {
                StatusCode::CONFLICT
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepoError> for OrderError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => Self::NotFound(msg),
            RepoError::Validation(msg) => Self::Validation(msg),
            RepoError::Duplicate(msg) | RepoError::Database(msg) => Self::Database(msg),
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Internal detail stays in the logs
            Self::Database(msg) => {
                tracing::error!(target: "orders", error = %msg, "Order operation failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(AppResponse::<()> {
            code: self.kind().to_string(),
            message,
            data: None,
        });

        (status, body).into_response()
    }
}

/// Result type for order domain operations
pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(OrderError::EmptyCart.kind(), "EMPTY_CART");
        assert_eq!(
            OrderError::OutOfStock {
                product: "p".to_string(),
                requested: 2,
                available: 1
            }
            .kind(),
            "OUT_OF_STOCK"
        );
        assert_eq!(
            OrderError::CancellationWindowClosed {
                status: OrderStatus::Delivering,
                elapsed_minutes: 45
            }
            .kind(),
            "CANCELLATION_WINDOW_CLOSED"
        );
    }

    #[test]
    fn test_repo_not_found_maps_to_not_found() {
        let err: OrderError = RepoError::NotFound("order x".to_string()).into();
        assert_eq!(err.kind(), "NOT_FOUND");
    }
}
