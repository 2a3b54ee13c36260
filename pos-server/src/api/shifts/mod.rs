//! Shift API 模块 (排班与看板)

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_manager;
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new().nest("/api/shifts", routes(state))
}

fn routes(state: &ServerState) -> Router<ServerState> {
    let employee_routes = Router::new()
        .route("/", get(handler::dashboard))
        .route("/stream", get(handler::stream));

    let manager_routes = Router::new()
        .route("/", post(handler::create))
        .route("/manage", get(handler::list_for_management))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_manager));

    employee_routes.merge(manager_routes)
}
