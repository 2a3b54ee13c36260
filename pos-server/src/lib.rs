//! Till POS Server - 门店收银与排班后端
//!
//! # 架构概述
//!
//! - **存储** (`store`): 文档存储抽象 (内存 / SQLite)，支持批量原子写入和变更推送
//! - **认证** (`auth`): 外部身份服务签发的 JWT
//! - **角色** (`roles`): 临时角色提权、审批、过期清理和路由守卫
//! - **排班** (`shifts`): 班次、考勤打卡、休息计时和统计
//! - **支付** (`payment`): 外部支付服务客户端
//! - **HTTP API** (`api`): RESTful API 接口与 SSE 推送
//!
//! # 模块结构
//!
//! ```text
//! pos-server/src/
//! ├── core/           # 配置、状态、后台任务、错误
//! ├── auth/           # JWT 认证、经理守卫
//! ├── store/          # 文档存储
//! ├── roles/          # 角色提权
//! ├── shifts/         # 排班与休息
//! ├── payment/        # 支付客户端
//! ├── notifications   # 站内通知
//! ├── api/            # HTTP 路由和处理器
//! └── utils/          # 工具函数
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod notifications;
pub mod payment;
pub mod roles;
pub mod shifts;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use crate::core::{Config, Server, ServerState};
pub use roles::RoleElevationManager;
pub use shifts::{BreakService, ShiftLifecycleManager};
pub use store::{DocumentStore, MemoryStore, SqliteStore};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 加载 .env 并按配置初始化日志
///
/// 配置错误时仍以默认级别初始化日志后返回错误。
pub fn setup_environment() -> crate::core::Result<Config> {
    dotenv::dotenv().ok();

    match Config::from_env() {
        Ok(config) => {
            init_logger_with_file(
                Some(&config.log_level),
                Some(config.log_json),
                config.log_dir.as_deref(),
            );
            Ok(config)
        }
        Err(e) => {
            init_logger();
            Err(e)
        }
    }
}

pub fn print_banner() {
    println!(
        r#"
 _____ _ _ _   ____   ___  ____
|_   _(_) | | |  _ \ / _ \/ ___|
  | | | | | | | |_) | | | \___ \
  | | | | | | |  __/| |_| |___) |
  |_| |_|_|_| |_|    \___/|____/
    "#
    );
}
