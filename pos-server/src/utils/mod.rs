//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] - 应用错误类型 (from shared::error)
//! - [`ApiResponse`] - API 响应结构 (from shared::error)
//! - 日志、校验、时间、重试、按键加锁等工具

pub mod clock;
pub mod keyed_lock;
pub mod logger;
pub mod retry;
pub mod time;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use clock::{Clock, ManualClock, SystemClock};
pub use keyed_lock::{KeyedGuard, KeyedLocks};
