//! 临时角色过期清理调度器
//!
//! 读取时已做过期判断，此任务只负责把已过期的覆盖记录写回基础角色，
//! 使离线用户的存储状态也保持一致。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::RoleElevationManager;

/// 注册为 `TaskKind::Periodic`，在 `start_background_tasks()` 中启动。
pub struct ElevationExpiryScheduler {
    roles: Arc<RoleElevationManager>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ElevationExpiryScheduler {
    pub fn new(
        roles: Arc<RoleElevationManager>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            roles,
            interval,
            shutdown,
        }
    }

    /// 主循环：周期扫描 + 关机信号
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Role elevation sweeper started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Role elevation sweeper received shutdown signal");
                    return;
                }
            }
        }
    }

    async fn sweep(&self) {
        match self.roles.sweep_expired().await {
            Ok(0) => tracing::debug!("No expired role elevations"),
            Ok(n) => tracing::info!(reverted = n, "Reverted expired role elevations"),
            Err(e) => tracing::error!(error = %e, "Role elevation sweep failed"),
        }
    }
}
