use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::{BackgroundTasks, Config, TaskKind};
use crate::db::DbService;
use crate::notify::NotificationService;
use crate::orders::OrderService;
use crate::reviews::ReviewService;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有字段都是浅拷贝 (Arc 或只持有 db 句柄的服务)，
/// Clone 成本极低，可直接作为 axum 的应用状态。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | db | 嵌入式数据库 |
/// | jwt_service | JWT 认证服务 |
/// | orders | 订单域服务 |
/// | reviews | 评价域服务 |
/// | notify | 通知服务 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    /// 订单域服务 (结算、状态机、自动确认)
    pub orders: OrderService,
    /// 评价域服务 (评分、留言、随机奖励)
    pub reviews: ReviewService,
    /// 通知服务
    pub notify: NotificationService,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/market.db) + 唯一索引
    /// 3. 各服务 (JWT, Orders, Reviews, Notify)
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("market.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");
        let db = db_service.db;

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let orders = OrderService::new(db.clone(), config);
        let reviews = ReviewService::new(db.clone());
        let notify = NotificationService::new(db.clone());

        Self {
            config: config.clone(),
            db,
            jwt_service,
            orders,
            reviews,
            notify,
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用。
    /// 注册的任务：
    /// - 订单自动确认扫描 (周期任务)
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let sweeper = self.orders.clone();
        let interval = self.config.sweep_interval_secs;
        let token = tasks.shutdown_token();
        tasks.spawn(
            "order-confirm-sweeper",
            TaskKind::Periodic,
            sweeper.run_confirm_sweeper(interval, token),
        );
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 获取 JWT 服务
    pub fn jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}

#[cfg(test)]
impl ServerState {
    /// 基于内存引擎的测试状态
    pub(crate) async fn for_tests() -> Self {
        let config = Config::from_env();
        let db = crate::db::connect_memory().await;
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let orders = OrderService::new(db.clone(), &config);
        let reviews = ReviewService::new(db.clone());
        let notify = NotificationService::new(db.clone());

        Self {
            config,
            db,
            jwt_service,
            orders,
            reviews,
            notify,
        }
    }
}
