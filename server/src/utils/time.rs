//! 时间工具函数
//!
//! 所有持久化时间戳统一为 `i64` Unix millis，
//! repository 层不接触 chrono 类型。

use chrono::Utc;

/// 当前时间 (Unix millis)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 自给定时间戳起经过的分钟数 (向下取整)
pub fn minutes_since(millis: i64, now: i64) -> i64 {
    (now - millis) / 60_000
}

/// 分钟 → 毫秒
pub const fn minutes_to_millis(minutes: i64) -> i64 {
    minutes * 60_000
}
