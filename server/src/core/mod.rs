//! 核心模块
//!
//! - [`config`] - 服务器配置
//! - [`state`] - 服务器状态 (ServerState)
//! - [`server`] - HTTP 服务器启动
//! - [`tasks`] - 后台任务管理

pub mod config;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;
pub use tasks::{BackgroundTasks, TaskKind};
