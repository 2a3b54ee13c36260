//! 角色提升：基础角色 / 临时角色、提升申请与审批、路由守卫

mod expiry;
mod manager;
pub mod route_guard;

pub use expiry::ElevationExpiryScheduler;
pub use manager::{ALLOWED_DURATIONS, RoleElevationManager, RoleSession, RoleTransition};
pub use route_guard::{RouteDecision, check_route, default_route};
