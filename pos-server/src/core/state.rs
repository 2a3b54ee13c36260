use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::JwtService;
use crate::core::config::{Config, StoreBackend};
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Result, ServerError};
use crate::notifications::NotificationService;
use crate::payment::PaymentClient;
use crate::roles::{ElevationExpiryScheduler, RoleElevationManager};
use crate::shifts::{BreakService, BreakTicker, ShiftLifecycleManager};
use crate::store::{DocumentStore, MemoryStore, SqliteStore};
use crate::utils::{Clock, SystemClock};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有服务显式注入，使用 Arc 实现浅拷贝。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | store | 文档存储 (memory / sqlite) |
/// | clock | 时间源 (测试可替换) |
/// | jwt_service | JWT 校验 |
/// | roles | 角色提升管理 |
/// | shifts | 班次 / 打卡 |
/// | breaks | 休息状态机 |
/// | notifications | 站内通知 |
/// | payments | 支付服务客户端 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub clock: Arc<dyn Clock>,
    pub jwt_service: Arc<JwtService>,
    pub roles: Arc<RoleElevationManager>,
    pub shifts: Arc<ShiftLifecycleManager>,
    pub breaks: Arc<BreakService>,
    pub notifications: NotificationService,
    pub payments: PaymentClient,
}

impl ServerState {
    /// 用给定存储和时钟组装所有服务
    pub fn with_store(
        config: Config,
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let notifications = NotificationService::new(store.clone(), clock.clone());
        let roles = Arc::new(RoleElevationManager::new(
            store.clone(),
            clock.clone(),
            notifications.clone(),
        ));
        let breaks = Arc::new(BreakService::new(store.clone(), clock.clone()));
        let shifts = Arc::new(ShiftLifecycleManager::new(
            store.clone(),
            clock.clone(),
            roles.clone(),
            breaks.clone(),
            notifications.clone(),
            config.timezone,
            config.shift_fetch_policy(),
        ));
        let payments = PaymentClient::new(
            config.payment_service_url.clone(),
            Duration::from_millis(config.payment_timeout_ms),
        )
        .map_err(|e| ServerError::Config(e.message))?;

        Ok(Self {
            config,
            store,
            clock,
            jwt_service,
            roles,
            shifts,
            breaks,
            notifications,
            payments,
        })
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 存储后端 (sqlite 时确保数据库目录存在)
    /// 2. 各服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = match config.store_backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store, data is lost on restart");
                Arc::new(MemoryStore::new())
            }
            StoreBackend::Sqlite => {
                let db_file = config.database_file();
                if let Some(dir) = db_file.parent().filter(|d| !d.as_os_str().is_empty()) {
                    ensure_dir(dir)?;
                }
                let path = db_file.to_string_lossy();
                tracing::info!(path = %path, "Opening SQLite document store");
                Arc::new(SqliteStore::open(&path).await?)
            }
        };

        Self::with_store(config.clone(), store, Arc::new(SystemClock))
    }

    /// 启动后台任务
    ///
    /// - 过期角色清理 (Periodic)
    /// - 休息计时 (Worker)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let sweeper = ElevationExpiryScheduler::new(
            self.roles.clone(),
            Duration::from_secs(self.config.elevation_sweep_secs.max(1)),
            tasks.shutdown_token(),
        );
        tasks.spawn("elevation_expiry", TaskKind::Periodic, sweeper.run());

        let ticker = BreakTicker::new(
            self.breaks.clone(),
            Duration::from_millis(self.config.break_tick_ms.max(100)),
            tasks.shutdown_token(),
        );
        tasks.spawn("break_ticker", TaskKind::Worker, ticker.run());

        tasks.log_summary();
        tasks
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}
