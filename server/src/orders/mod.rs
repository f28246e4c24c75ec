//! Order Lifecycle Module
//!
//! 订单域的核心：结算、状态机、取消流程、自动确认。
//!
//! - [`error`] - 域错误 (稳定错误码)
//! - [`checkout`] - 结算流程
//! - [`lifecycle`] - 用户取消 + 管理员状态迁移
//! - [`sweep`] - NEW 订单自动确认 (定时器 + 周期扫描)

pub mod checkout;
pub mod error;
pub mod lifecycle;
pub mod sweep;

pub use checkout::CheckoutRequest;
pub use error::{OrderError, OrderResult};

use crate::core::Config;
use crate::db::repository::{CartRepository, OrderRepository, ProductRepository, UserRepository};
use crate::inventory::InventoryLedger;
use crate::notify::NotificationService;
use crate::pricing::DiscountResolver;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// Order domain service
///
/// 所有订单操作的入口。Clone 廉价 (内部仓库只持有 db 句柄)，
/// 可直接移入定时任务。
#[derive(Clone)]
pub struct OrderService {
    pub(crate) orders: OrderRepository,
    pub(crate) carts: CartRepository,
    pub(crate) products: ProductRepository,
    pub(crate) users: UserRepository,
    pub(crate) inventory: InventoryLedger,
    pub(crate) resolver: DiscountResolver,
    pub(crate) notify: NotificationService,
    /// 用户取消 NEW 订单的时间窗口 (分钟)
    pub(crate) cancel_window_minutes: i64,
    /// NEW 订单自动确认延迟 (分钟)
    pub(crate) auto_confirm_minutes: i64,
}

impl OrderService {
    pub fn new(db: Surreal<Db>, config: &Config) -> Self {
        Self {
            orders: OrderRepository::new(db.clone()),
            carts: CartRepository::new(db.clone()),
            products: ProductRepository::new(db.clone()),
            users: UserRepository::new(db.clone()),
            inventory: InventoryLedger::new(db.clone()),
            resolver: DiscountResolver::new(db.clone()),
            notify: NotificationService::new(db),
            cancel_window_minutes: config.cancel_window_minutes,
            auto_confirm_minutes: config.auto_confirm_minutes,
        }
    }
}
