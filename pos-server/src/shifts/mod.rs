//! 班次生命周期：排班、打卡、休息、周统计

mod analytics;
mod breaks;
mod manager;

pub use analytics::compute_analytics;
pub use breaks::{BreakService, BreakTicker};
pub use manager::{ShiftDashboard, ShiftLifecycleManager};
