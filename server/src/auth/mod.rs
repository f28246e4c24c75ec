//! 认证模块
//!
//! - [`jwt`] - JWT 令牌服务 (生成、验证)
//! - [`extractor`] - Axum 提取器 (CurrentUser)
//! - [`middleware`] - 认证/授权中间件

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};
