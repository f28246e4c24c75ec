//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`categories`] - 分类管理接口
//! - [`products`] - 商品管理接口
//! - [`cart`] - 购物车接口
//! - [`favorites`] - 收藏接口
//! - [`orders`] - 订单接口 (结算、取消、状态管理)
//! - [`promotions`] - 优惠码管理接口
//! - [`reviews`] - 评价接口
//! - [`notifications`] - 通知接口

pub mod cart;
pub mod categories;
pub mod favorites;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod reviews;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
