//! Payment API 模块
//!
//! 代理外部支付服务；服务端不保存支付状态。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/config", get(handler::config))
        .route("/intents", post(handler::create_intent))
        .route("/refunds", post(handler::refund))
        .route("/refunds/{id}", get(handler::refund_status))
}
