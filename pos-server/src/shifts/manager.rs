//! Shift lifecycle: scheduling, attendance, per-user weekly dashboard

use chrono_tz::Tz;
use dashmap::DashMap;
use futures::stream::BoxStream;
use futures::{StreamExt, TryFutureExt};
use serde::Serialize;
use std::sync::Arc;

use shared::models::{
    AttendanceRecord, AttendanceStatus, BreakRecord, Notification, Shift, ShiftAnalytics,
    ShiftCreate, ShiftStatus, ShiftUpdate, ShiftWindow, UserProfile, UserRole,
};

use crate::auth::CurrentUser;
use crate::notifications::NotificationService;
use crate::roles::RoleElevationManager;
use crate::store::document::{self, collections};
use crate::store::{self as docstore, Direction, DocumentStore, FilterOp, Query, StoreResult};
use crate::utils::retry::{RetryPolicy, retry_with_backoff};
use crate::utils::time;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult, Clock, ErrorCode, KeyedLocks};

use super::analytics::compute_analytics;
use super::breaks::BreakService;

/// Everything one user's shift screen shows for the current week
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDashboard {
    pub window: Option<ShiftWindow>,
    pub shifts: Vec<Shift>,
    pub attendance: Vec<AttendanceRecord>,
    pub notifications: Vec<Notification>,
    pub break_history: Vec<BreakRecord>,
    pub active_break: Option<BreakRecord>,
    pub analytics: Option<ShiftAnalytics>,
    /// Last refresh failure; the rest of the dashboard is the previous data
    pub error: Option<String>,
    pub refreshed_at: Option<i64>,
}

#[derive(Debug)]
pub struct ShiftLifecycleManager {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    roles: Arc<RoleElevationManager>,
    breaks: Arc<BreakService>,
    notifications: NotificationService,
    timezone: Tz,
    fetch_policy: RetryPolicy,
    dashboards: DashMap<String, ShiftDashboard>,
    /// Keys: `shift:cashier` for clock-in, `attendance:id` for clock-out
    locks: KeyedLocks,
}

impl ShiftLifecycleManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        roles: Arc<RoleElevationManager>,
        breaks: Arc<BreakService>,
        notifications: NotificationService,
        timezone: Tz,
        fetch_policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            roles,
            breaks,
            notifications,
            timezone,
            fetch_policy,
            dashboards: DashMap::new(),
            locks: KeyedLocks::new(),
        }
    }

    // ========== Dashboard ==========

    /// Reload the user's week; on failure keep the previous data and set `error`
    pub async fn refresh_shifts(&self, user: &CurrentUser) -> ShiftDashboard {
        match self.load_dashboard(user).await {
            Ok(dashboard) => {
                self.dashboards.insert(user.id.clone(), dashboard.clone());
                dashboard
            }
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Failed to refresh shifts");
                let mut entry = self.dashboards.entry(user.id.clone()).or_default();
                entry.error = Some(e.message);
                entry.clone()
            }
        }
    }

    async fn load_dashboard(&self, user: &CurrentUser) -> AppResult<ShiftDashboard> {
        let role = self.roles.effective_role(user).await?;
        let now = self.clock.now_millis();
        let window = time::week_window(now, self.timezone);
        let own = (role == UserRole::Cashier).then_some(user.id.as_str());

        let store = self.store.as_ref();
        let shifts_q = shifts_query(window, own);
        let attendance_q = attendance_query(window, own);
        let shifts_fut = document::find::<Shift>(store, &shifts_q).map_err(AppError::from);
        let attendance_fut =
            document::find::<AttendanceRecord>(store, &attendance_q).map_err(AppError::from);
        let notifications_fut = self.notifications.list_unread(&user.id);
        let cashier_fut = async {
            match own {
                Some(id) => {
                    let (history, active) = futures::try_join!(
                        self.breaks.history(id, window),
                        self.breaks.active_break(id),
                    )?;
                    Ok::<_, AppError>((history, active))
                }
                None => Ok((Vec::new(), None)),
            }
        };
        let all_breaks_fut = async {
            match own {
                Some(_) => Ok(None),
                None => self.breaks.all_in_window(window).await.map(Some),
            }
        };

        let (shifts, attendance, notifications, (break_history, active_break), all_breaks) = futures::try_join!(
            shifts_fut,
            attendance_fut,
            notifications_fut,
            cashier_fut,
            all_breaks_fut,
        )?;

        let analytics = all_breaks.map(|breaks| compute_analytics(window, &shifts, &attendance, &breaks, now));

        Ok(ShiftDashboard {
            window: Some(window),
            shifts,
            attendance,
            notifications,
            break_history,
            active_break,
            analytics,
            error: None,
            refreshed_at: Some(now),
        })
    }

    /// Last dashboard built for the user, without refetching
    pub fn cached_dashboard(&self, user_id: &str) -> Option<ShiftDashboard> {
        self.dashboards.get(user_id).map(|d| d.clone())
    }

    /// Shift-management screen: all shifts between two dates (inclusive), retried
    pub async fn list_shifts_for_management(&self, start: &str, end: &str) -> AppResult<Vec<Shift>> {
        let window = time::date_range_window(
            time::parse_date(start)?,
            time::parse_date(end)?,
            self.timezone,
        )?;
        let query = shifts_query(window, None);
        let (store, query) = (self.store.as_ref(), &query);

        retry_with_backoff(self.fetch_policy, "list_shifts_for_management", move |_| {
            document::find::<Shift>(store, query).map_err(AppError::from)
        })
        .await
    }

    // ========== Scheduling ==========

    async fn employee(&self, employee_id: &str) -> AppResult<UserProfile> {
        document::fetch::<UserProfile>(self.store.as_ref(), employee_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::EmployeeNotFound).with_detail("employeeId", employee_id))
    }

    fn validate_times(&self, start_time: i64, end_time: i64) -> AppResult<()> {
        if end_time <= start_time {
            return Err(AppError::new(ErrorCode::ShiftInvalidTimeRange));
        }
        if start_time < self.clock.now_millis() {
            return Err(AppError::new(ErrorCode::ShiftStartInPast));
        }
        Ok(())
    }

    pub async fn create_shift(&self, input: ShiftCreate) -> AppResult<Shift> {
        self.validate_times(input.start_time, input.end_time)?;
        validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)?;
        let employee = self.employee(&input.employee_id).await?;

        let now = self.clock.now_millis();
        let mut shift = Shift {
            id: None,
            employee_id: input.employee_id,
            start_time: input.start_time,
            end_time: input.end_time,
            status: ShiftStatus::Active,
            cashier_name: employee.name,
            cashier_email: employee.email,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };
        let id = document::insert(self.store.as_ref(), &shift).await.map_err(|e| {
            tracing::error!(employee_id = %shift.employee_id, error = %e, "Failed to create shift");
            AppError::from(e)
        })?;
        shift.id = Some(id);

        tracing::info!(shift_id = ?shift.id, employee_id = %shift.employee_id, "Shift created");
        self.notifications
            .notify(
                &shift.employee_id,
                "New shift assigned",
                &format!("You have a new shift starting {}", shared::util::format_millis(shift.start_time)),
            )
            .await;
        Ok(shift)
    }

    pub async fn update_shift(&self, id: &str, input: ShiftUpdate) -> AppResult<Shift> {
        let mut shift: Shift = document::fetch(self.store.as_ref(), id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ShiftNotFound))?;

        let start_time = input.start_time.unwrap_or(shift.start_time);
        let end_time = input.end_time.unwrap_or(shift.end_time);
        if end_time <= start_time {
            return Err(AppError::new(ErrorCode::ShiftInvalidTimeRange));
        }
        if input.start_time.is_some_and(|s| s != shift.start_time) && start_time < self.clock.now_millis() {
            return Err(AppError::new(ErrorCode::ShiftStartInPast));
        }
        validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)?;

        if let Some(employee_id) = input.employee_id.filter(|e| *e != shift.employee_id) {
            let employee = self.employee(&employee_id).await?;
            shift.employee_id = employee_id;
            shift.cashier_name = employee.name;
            shift.cashier_email = employee.email;
        }
        shift.start_time = start_time;
        shift.end_time = end_time;
        if let Some(status) = input.status {
            shift.status = status;
        }
        if input.notes.is_some() {
            shift.notes = input.notes;
        }
        shift.updated_at = self.clock.now_millis();

        document::put(self.store.as_ref(), id, &shift).await.map_err(|e| {
            tracing::error!(shift_id = %id, error = %e, "Failed to update shift");
            AppError::from(e)
        })?;
        tracing::info!(shift_id = %id, "Shift updated");
        Ok(shift)
    }

    pub async fn delete_shift(&self, id: &str) -> AppResult<()> {
        let shift: Shift = document::fetch(self.store.as_ref(), id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ShiftNotFound))?;
        document::remove::<Shift>(self.store.as_ref(), id).await?;

        tracing::info!(shift_id = %id, "Shift deleted");
        self.notifications
            .notify(
                &shift.employee_id,
                "Shift cancelled",
                &format!("Your shift starting {} was removed", shared::util::format_millis(shift.start_time)),
            )
            .await;
        Ok(())
    }

    // ========== Attendance ==========

    /// Clock a cashier in; each failed precondition has its own error code
    pub async fn clock_in(&self, shift_id: &str, cashier_id: &str) -> AppResult<AttendanceRecord> {
        let _guard = self.locks.lock(&format!("{shift_id}:{cashier_id}")).await;
        let store = self.store.as_ref();

        let shift: Shift = document::fetch(store, shift_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ShiftNotFound))?;
        if shift.status != ShiftStatus::Active {
            return Err(AppError::new(ErrorCode::ShiftNotActive));
        }
        if shift.employee_id != cashier_id {
            return Err(AppError::new(ErrorCode::ShiftNotAssigned));
        }
        let cashier: UserProfile = document::fetch(store, cashier_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::CashierNotFound))?;

        let open = Query::collection(collections::ATTENDANCE)
            .eq("shiftId", shift_id)
            .eq("cashierId", cashier_id)
            .eq("status", "active")
            .limit(1);
        if !document::find::<AttendanceRecord>(store, &open).await?.is_empty() {
            return Err(AppError::new(ErrorCode::AlreadyClockedIn));
        }

        let now = self.clock.now_millis();
        if now < shift.start_time {
            return Err(AppError::new(ErrorCode::ClockInTooEarly));
        }
        if now > shift.end_time {
            return Err(AppError::new(ErrorCode::ClockInTooLate));
        }

        let mut record = AttendanceRecord {
            id: None,
            shift_id: shift_id.to_string(),
            cashier_id: cashier_id.to_string(),
            clock_in_time: now,
            clock_out_time: None,
            status: AttendanceStatus::Active,
            cashier_name: cashier.name,
            cashier_email: cashier.email,
        };
        let id = document::insert(store, &record).await.map_err(|e| {
            tracing::error!(shift_id = %shift_id, cashier_id = %cashier_id, error = %e, "Failed to clock in");
            AppError::from(e)
        })?;
        record.id = Some(id);

        tracing::info!(shift_id = %shift_id, cashier_id = %cashier_id, "Clocked in");
        Ok(record)
    }

    pub async fn attendance(&self, attendance_id: &str) -> AppResult<AttendanceRecord> {
        document::fetch(self.store.as_ref(), attendance_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::AttendanceNotFound))
    }

    /// Close an attendance record; a second call fails with `AlreadyClockedOut`
    pub async fn clock_out(&self, attendance_id: &str) -> AppResult<AttendanceRecord> {
        if attendance_id.trim().is_empty() {
            return Err(AppError::new(ErrorCode::AttendanceIdRequired));
        }
        let _guard = self.locks.lock(&format!("attendance:{attendance_id}")).await;

        let mut record = self.attendance(attendance_id).await?;
        if !record.is_active() {
            return Err(AppError::new(ErrorCode::AlreadyClockedOut));
        }

        let now = self.clock.now_millis();
        record.clock_out_time = Some(now);
        record.status = AttendanceStatus::Completed;
        document::patch::<AttendanceRecord>(
            self.store.as_ref(),
            attendance_id,
            serde_json::json!({ "clockOutTime": now, "status": record.status }),
        )
        .await
        .map_err(|e| {
            tracing::error!(attendance_id = %attendance_id, error = %e, "Failed to clock out");
            AppError::from(e)
        })?;

        tracing::info!(attendance_id = %attendance_id, cashier_id = %record.cashier_id, "Clocked out");
        Ok(record)
    }

    // ========== Push ==========

    /// Live view of the user's shifts (all shifts for managers)
    pub async fn subscribe_shifts(
        &self,
        user: &CurrentUser,
    ) -> AppResult<BoxStream<'static, AppResult<Vec<Shift>>>> {
        let role = self.roles.effective_role(user).await?;
        let mut query = Query::collection(collections::SHIFTS).order_by("startTime", Direction::Asc);
        if role == UserRole::Cashier {
            query = query.eq("employeeId", user.id.as_str());
        }

        let stream = docstore::subscribe(self.store.clone(), query).map(|snapshot| {
            snapshot
                .and_then(|docs| {
                    docs.into_iter()
                        .map(document::from_stored)
                        .collect::<StoreResult<Vec<Shift>>>()
                })
                .map_err(AppError::from)
        });
        Ok(stream.boxed())
    }
}

fn shifts_query(window: ShiftWindow, employee_id: Option<&str>) -> Query {
    let query = Query::collection(collections::SHIFTS)
        .filter("startTime", FilterOp::Ge, window.start)
        .filter("startTime", FilterOp::Lt, window.end)
        .order_by("startTime", Direction::Asc);
    match employee_id {
        Some(id) => query.eq("employeeId", id),
        None => query,
    }
}

fn attendance_query(window: ShiftWindow, cashier_id: Option<&str>) -> Query {
    let query = Query::collection(collections::ATTENDANCE)
        .filter("clockInTime", FilterOp::Ge, window.start)
        .filter("clockInTime", FilterOp::Lt, window.end)
        .order_by("clockInTime", Direction::Desc);
    match cashier_id {
        Some(id) => query.eq("cashierId", id),
        None => query,
    }
}
