//! Break API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::{BreakRecord, BreakStart, BreakTransition};

/// Break state as returned to the client
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakView {
    pub transition: BreakTransition,
    pub remaining_seconds: i64,
    #[serde(rename = "break")]
    pub record: BreakRecord,
}

impl BreakView {
    fn new(record: BreakRecord, now: i64) -> Self {
        Self {
            transition: BreakTransition {
                employee_id: record.employee_id.clone(),
                break_id: record.id.clone(),
                status: record.status,
            },
            remaining_seconds: record.remaining_seconds(now),
            record,
        }
    }
}

fn view(state: &ServerState, record: BreakRecord) -> Json<BreakView> {
    Json(BreakView::new(record, state.clock.now_millis()))
}

/// GET /api/breaks/active - 当前未结束的休息 (无则为 null)
pub async fn active(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Option<BreakView>>> {
    let now = state.clock.now_millis();
    let active = state.breaks.active_break(&user.id).await?;
    Ok(Json(active.map(|record| BreakView::new(record, now))))
}

/// POST /api/breaks - 开始休息
pub async fn start(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<BreakStart>,
) -> AppResult<Json<BreakView>> {
    let record = state.breaks.start_break(&user.id, payload.break_type).await?;
    let mut started = BreakView::new(record, state.clock.now_millis());
    // 新会话的状态变更不带 breakId，由存储分配后见 `break.id`
    started.transition.break_id = None;
    Ok(Json(started))
}

/// POST /api/breaks/{id}/pause
pub async fn pause(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<BreakView>> {
    let record = state.breaks.pause_break(&user.id, &id).await?;
    Ok(view(&state, record))
}

/// POST /api/breaks/{id}/resume
pub async fn resume(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<BreakView>> {
    let record = state.breaks.resume_break(&user.id, &id).await?;
    Ok(view(&state, record))
}

/// POST /api/breaks/{id}/complete - 提前结束
pub async fn complete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<BreakView>> {
    let record = state.breaks.complete_break(&user.id, &id).await?;
    Ok(view(&state, record))
}

/// POST /api/breaks/{id}/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<BreakView>> {
    let record = state.breaks.cancel_break(&user.id, &id).await?;
    Ok(view(&state, record))
}
