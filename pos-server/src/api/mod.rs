//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查 (公开)
//! - [`roles`] - 临时角色提权
//! - [`shifts`] - 排班、看板与实时推送
//! - [`attendance`] - 上下班打卡
//! - [`breaks`] - 休息计时
//! - [`notifications`] - 站内通知
//! - [`payments`] - 外部支付服务代理
//!
//! 除 `/health` 外所有路由都在 `/api/` 下并要求 JWT 认证。

pub mod attendance;
pub mod breaks;
pub mod health;
pub mod middleware;
pub mod notifications;
pub mod payments;
pub mod roles;
pub mod shifts;

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::core::ServerState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        // uuid 字符串总是合法的 header 值
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Build a router with all routes registered (no global middleware)
pub fn build_router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(roles::router())
        .merge(shifts::router(state))
        .merge(attendance::router())
        .merge(breaks::router())
        .merge(notifications::router())
        .merge(payments::router())
}

/// Build a fully configured application with all middleware
///
/// Used by both the HTTP server and in-process tests
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router(state)
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Request logging
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        // Trace - Request tracing
        .layer(TraceLayer::new_for_http())
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        // JWT authentication - injects CurrentUser before routes run
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth))
}
