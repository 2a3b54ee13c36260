//! Role API 模块 (临时角色提权)
//!
//! 审批/拒绝/待办列表由服务层按有效角色校验经理身份。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/roles", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/session", get(handler::session))
        .route("/route-check", get(handler::route_check))
        .route("/requests", get(handler::list_pending).post(handler::request_elevation))
        .route("/requests/{user_id}/approve", post(handler::approve))
        .route("/requests/{user_id}/deny", post(handler::deny))
        .route("/switch-to-cashier", post(handler::switch_to_cashier))
        .route("/revert", post(handler::revert))
}
