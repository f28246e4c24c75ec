//! Market Server - 电商后端
//!
//! # 架构概述
//!
//! 单进程 HTTP 服务，核心是订单生命周期状态机与折扣解析：
//!
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储 + 仓库层
//! - **认证** (`auth`): 外部签发的 Bearer JWT 校验与管理员守卫
//! - **订单** (`orders`): 结算、状态机、取消流程、自动确认
//! - **定价** (`pricing`): 优惠码/积分折扣解析，decimal 金额运算
//! - **库存** (`inventory`): 原子条件扣减/回补
//! - **评价** (`reviews`): 评分/留言 + 随机奖励
//! - **通知** (`notify`): 尽力而为的通知写入
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # JWT 校验、提取器、中间件
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (模型 + 仓库)
//! ├── orders/        # 订单域
//! ├── pricing/       # 折扣解析与金额运算
//! ├── inventory/     # 库存台账
//! ├── reviews/       # 评价域
//! ├── notify/        # 通知
//! └── utils/         # 错误、日志、时间
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod inventory;
pub mod notify;
pub mod orders;
pub mod pricing;
pub mod reviews;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::{OrderError, OrderService};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置进程环境：dotenv + 日志
///
/// 必须在读取 [`Config`] 之前调用，否则 `.env` 不生效。
pub fn setup_environment() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}
