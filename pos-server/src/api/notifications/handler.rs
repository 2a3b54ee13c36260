//! Notification API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::Notification;

/// GET /api/notifications - 未读通知 (最新在前)
pub async fn list_unread(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Notification>>> {
    let unread = state.notifications.list_unread(&user.id).await?;
    Ok(Json(unread))
}

/// POST /api/notifications/{id}/read - 标记已读
pub async fn mark_read(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    state.notifications.mark_read(&user.id, &id).await?;
    Ok(Json(true))
}
