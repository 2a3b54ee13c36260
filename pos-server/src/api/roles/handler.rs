//! Role API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::roles::{RoleSession, RoleTransition, RouteDecision, check_route, default_route};
use crate::utils::AppResult;
use shared::models::{ElevationDuration, RoleRequest, RoleRequestCreate};

/// GET /api/roles/session - 当前用户的角色状态 (读时检查过期)
pub async fn session(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<RoleSession>> {
    let session = state.roles.rehydrate(&user).await?;
    Ok(Json(session))
}

#[derive(Debug, Deserialize)]
pub struct RouteCheckQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCheckResponse {
    #[serde(flatten)]
    pub decision: RouteDecision,
    pub home: &'static str,
}

/// GET /api/roles/route-check?path= - 按有效角色判断路由是否可访问
pub async fn route_check(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<RouteCheckQuery>,
) -> AppResult<Json<RouteCheckResponse>> {
    let role = state.roles.effective_role(&user).await?;
    Ok(Json(RouteCheckResponse {
        decision: check_route(role, &query.path),
        home: default_route(role),
    }))
}

/// GET /api/roles/requests - 待审批的提权请求 (经理)
pub async fn list_pending(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<RoleRequest>>> {
    let requests = state.roles.list_pending_requests(&user).await?;
    Ok(Json(requests))
}

/// POST /api/roles/requests - 申请临时经理角色
pub async fn request_elevation(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<RoleRequestCreate>,
) -> AppResult<Json<RoleRequest>> {
    let request = state
        .roles
        .request_role_elevation(&user, &payload.reason)
        .await?;
    Ok(Json(request))
}

/// POST /api/roles/requests/{user_id}/approve - 批准请求并授予临时角色
pub async fn approve(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
    Json(payload): Json<ElevationDuration>,
) -> AppResult<Json<RoleRequest>> {
    let request = state
        .roles
        .approve_role_request(&user, &user_id, payload.duration_minutes)
        .await?;
    Ok(Json(request))
}

/// POST /api/roles/requests/{user_id}/deny - 拒绝请求
pub async fn deny(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<RoleRequest>> {
    let request = state.roles.deny_role_request(&user, &user_id).await?;
    Ok(Json(request))
}

/// POST /api/roles/switch-to-cashier - 经理临时切换为收银员
pub async fn switch_to_cashier(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ElevationDuration>,
) -> AppResult<Json<RoleTransition>> {
    let transition = state
        .roles
        .switch_to_cashier_role(&user, payload.duration_minutes)
        .await?;
    Ok(Json(transition))
}

/// POST /api/roles/revert - 恢复基础角色
pub async fn revert(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<RoleTransition>> {
    let transition = state.roles.revert_to_base_role(&user).await?;
    Ok(Json(transition))
}
