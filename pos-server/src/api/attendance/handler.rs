//! Attendance API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::security_log;
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::models::{AttendanceRecord, ClockInRequest, UserRole};

/// POST /api/attendance/clock-in - 当前用户在指定班次上班打卡
pub async fn clock_in(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ClockInRequest>,
) -> AppResult<Json<AttendanceRecord>> {
    let record = state.shifts.clock_in(&payload.shift_id, &user.id).await?;
    Ok(Json(record))
}

/// POST /api/attendance/{id}/clock-out - 下班打卡
///
/// 收银员只能结束自己的考勤记录；经理可结束任意记录。
pub async fn clock_out(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AttendanceRecord>> {
    if state.roles.effective_role(&user).await? == UserRole::Cashier {
        let record = state.shifts.attendance(&id).await?;
        if record.cashier_id != user.id {
            security_log!(
                "WARN",
                "clock_out_denied",
                user_id = user.id.clone(),
                attendance_id = id.clone()
            );
            return Err(AppError::new(ErrorCode::AttendanceNotFound));
        }
    }

    let record = state.shifts.clock_out(&id).await?;
    Ok(Json(record))
}
