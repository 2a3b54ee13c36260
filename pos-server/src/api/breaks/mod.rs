//! Break API 模块 (休息计时)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/breaks", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::start))
        .route("/active", get(handler::active))
        .route("/{id}/pause", post(handler::pause))
        .route("/{id}/resume", post(handler::resume))
        .route("/{id}/complete", post(handler::complete))
        .route("/{id}/cancel", post(handler::cancel))
}
