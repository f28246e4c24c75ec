//! 工具模块
//!
//! - [`error`] - 统一错误处理 (AppError / AppResponse)
//! - [`logger`] - 日志初始化
//! - [`time`] - 时间工具 (Unix millis)

pub mod error;
pub mod logger;
pub mod time;

pub use error::{AppError, AppResponse, AppResult};
pub use time::{minutes_since, minutes_to_millis, now_millis};
