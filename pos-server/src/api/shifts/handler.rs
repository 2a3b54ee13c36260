//! Shift API Handlers

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::shifts::ShiftDashboard;
use crate::utils::AppResult;
use shared::models::{Shift, ShiftCreate, ShiftUpdate};

/// GET /api/shifts - 本周看板 (班次、考勤、休息、通知、统计)
///
/// 加载失败时保留上一次的看板并带上 `error`。
pub async fn dashboard(State(state): State<ServerState>, user: CurrentUser) -> Json<ShiftDashboard> {
    Json(state.shifts.refresh_shifts(&user).await)
}

/// GET /api/shifts/stream - 班次实时推送 (SSE)
pub async fn stream(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let updates = state.shifts.subscribe_shifts(&user).await?;
    let user_id = user.id.clone();

    let events = updates.map(move |snapshot| {
        let event = match snapshot {
            Ok(shifts) => Event::default()
                .event("shifts")
                .json_data(&shifts)
                .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Shift subscription failed");
                Event::default().event("error").data(e.message)
            }
        };
        Ok(event)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Query params for the management view
#[derive(Debug, Deserialize)]
pub struct ManageQuery {
    /// YYYY-MM-DD
    pub start: String,
    /// YYYY-MM-DD (含当天)
    pub end: String,
}

/// GET /api/shifts/manage?start=&end= - 排班管理 (经理)
pub async fn list_for_management(
    State(state): State<ServerState>,
    Query(query): Query<ManageQuery>,
) -> AppResult<Json<Vec<Shift>>> {
    let shifts = state
        .shifts
        .list_shifts_for_management(&query.start, &query.end)
        .await?;
    Ok(Json(shifts))
}

/// POST /api/shifts - 创建班次 (经理)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ShiftCreate>,
) -> AppResult<Json<Shift>> {
    let shift = state.shifts.create_shift(payload).await?;
    tracing::info!(
        manager_id = %user.id,
        shift_id = ?shift.id,
        employee_id = %shift.employee_id,
        "Shift created"
    );
    Ok(Json(shift))
}

/// PUT /api/shifts/{id} - 更新班次 (经理)
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ShiftUpdate>,
) -> AppResult<Json<Shift>> {
    let shift = state.shifts.update_shift(&id, payload).await?;
    tracing::info!(manager_id = %user.id, shift_id = %id, "Shift updated");
    Ok(Json(shift))
}

/// DELETE /api/shifts/{id} - 删除班次 (经理)
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    state.shifts.delete_shift(&id).await?;
    tracing::info!(manager_id = %user.id, shift_id = %id, "Shift deleted");
    Ok(Json(true))
}
