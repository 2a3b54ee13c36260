//! Break state machine
//!
//! `none → active → {paused ⇄ active} → {completed | cancelled}`, at most one
//! open (active or paused) break per employee, started only while the
//! employee is clocked in. Elapsed time is always derived
//! from the persisted `elapsedMillis` / `resumedAt` pair, so a reload or a
//! server restart never loses the timer position.

use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use shared::models::{AttendanceRecord, BreakRecord, BreakStatus, BreakType, ShiftWindow};

use crate::store::document::{self, collections};
use crate::store::{Direction, DocumentStore, FilterOp, Query};
use crate::utils::{AppError, AppResult, Clock, ErrorCode, KeyedLocks};

#[derive(Debug)]
pub struct BreakService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    /// Per-employee; serialises start and transitions
    locks: KeyedLocks,
}

impl BreakService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            locks: KeyedLocks::new(),
        }
    }

    fn open_query(employee_id: &str) -> Query {
        Query::collection(collections::BREAKS)
            .eq("employeeId", employee_id)
            .filter(
                "status",
                FilterOp::In,
                json!([BreakStatus::Active.as_str(), BreakStatus::Paused.as_str()]),
            )
            .order_by("startTime", Direction::Desc)
    }

    /// Whether the employee has an open attendance record
    async fn is_clocked_in(&self, employee_id: &str) -> AppResult<bool> {
        let query = Query::collection(collections::ATTENDANCE)
            .eq("cashierId", employee_id)
            .eq("status", "active")
            .limit(1);
        let open: Vec<AttendanceRecord> = document::find(self.store.as_ref(), &query).await?;
        Ok(open.iter().any(AttendanceRecord::is_active))
    }

    /// Open breaks after completing any that ran out
    async fn open_breaks(&self, employee_id: &str) -> AppResult<Vec<BreakRecord>> {
        let now = self.clock.now_millis();
        let found: Vec<BreakRecord> =
            document::find(self.store.as_ref(), &Self::open_query(employee_id)).await?;

        let mut open = Vec::with_capacity(found.len());
        for record in found {
            if record.is_due(now) {
                self.finish_due(record).await?;
            } else {
                open.push(record);
            }
        }
        Ok(open)
    }

    /// Complete a break whose timer ran out, ending it when it reached zero
    async fn finish_due(&self, mut record: BreakRecord) -> AppResult<BreakRecord> {
        let remaining = record.total_millis() - record.elapsed_millis;
        let ended_at = record
            .resumed_at
            .map(|r| r + remaining)
            .unwrap_or_else(|| self.clock.now_millis());
        record.elapsed_millis = record.total_millis();
        record.resumed_at = None;
        record.end_time = Some(ended_at);
        record.status = BreakStatus::Completed;
        self.persist(&record).await?;
        tracing::info!(
            employee_id = %record.employee_id,
            break_id = ?record.id,
            break_type = %record.break_type.as_str(),
            "Break completed automatically"
        );
        Ok(record)
    }

    async fn persist(&self, record: &BreakRecord) -> AppResult<()> {
        let id = record
            .id
            .as_deref()
            .ok_or_else(|| AppError::new(ErrorCode::BreakIdRequired))?;
        let fields: Value = json!({
            "status": record.status,
            "elapsedMillis": record.elapsed_millis,
            "resumedAt": record.resumed_at,
            "endTime": record.end_time,
        });
        document::patch::<BreakRecord>(self.store.as_ref(), id, fields)
            .await
            .map_err(|e| {
                tracing::error!(break_id = %id, error = %e, "Failed to update break");
                AppError::from(e)
            })
    }

    /// Start a new break; needs an open attendance record and no other open break
    pub async fn start_break(&self, employee_id: &str, break_type: BreakType) -> AppResult<BreakRecord> {
        let _guard = self.locks.lock(employee_id).await;

        if !self.is_clocked_in(employee_id).await? {
            return Err(AppError::new(ErrorCode::NotClockedIn));
        }

        if !self.open_breaks(employee_id).await?.is_empty() {
            return Err(AppError::new(ErrorCode::BreakInProgress));
        }

        let mut record = BreakRecord::start(employee_id, break_type, self.clock.now_millis());
        let id = document::insert(self.store.as_ref(), &record)
            .await
            .map_err(|e| {
                tracing::error!(employee_id = %employee_id, error = %e, "Failed to start break");
                AppError::from(e)
            })?;
        record.id = Some(id);

        tracing::info!(
            employee_id = %employee_id,
            break_id = ?record.id,
            break_type = %break_type.as_str(),
            "Break started"
        );
        Ok(record)
    }

    pub async fn pause_break(&self, employee_id: &str, break_id: &str) -> AppResult<BreakRecord> {
        self.transition(employee_id, break_id, BreakStatus::Paused).await
    }

    pub async fn resume_break(&self, employee_id: &str, break_id: &str) -> AppResult<BreakRecord> {
        self.transition(employee_id, break_id, BreakStatus::Active).await
    }

    pub async fn complete_break(&self, employee_id: &str, break_id: &str) -> AppResult<BreakRecord> {
        self.transition(employee_id, break_id, BreakStatus::Completed).await
    }

    pub async fn cancel_break(&self, employee_id: &str, break_id: &str) -> AppResult<BreakRecord> {
        self.transition(employee_id, break_id, BreakStatus::Cancelled).await
    }

    async fn transition(
        &self,
        employee_id: &str,
        break_id: &str,
        next: BreakStatus,
    ) -> AppResult<BreakRecord> {
        if break_id.trim().is_empty() {
            return Err(AppError::new(ErrorCode::BreakIdRequired));
        }
        let _guard = self.locks.lock(employee_id).await;

        let mut record: BreakRecord = document::fetch(self.store.as_ref(), break_id)
            .await?
            .filter(|r: &BreakRecord| r.employee_id == employee_id)
            .ok_or_else(|| AppError::new(ErrorCode::BreakNotFound))?;

        let now = self.clock.now_millis();
        if record.is_due(now) {
            record = self.finish_due(record).await?;
        }

        if !record.status.can_transition_to(next) {
            return Err(AppError::with_message(
                ErrorCode::BreakInvalidTransition,
                format!("Invalid break transition from {} to {}", record.status, next),
            ));
        }

        match next {
            BreakStatus::Active => {
                record.resumed_at = Some(now);
            }
            BreakStatus::Paused => {
                record.elapsed_millis = record.elapsed_millis_at(now);
                record.resumed_at = None;
            }
            BreakStatus::Completed | BreakStatus::Cancelled => {
                record.elapsed_millis = record.elapsed_millis_at(now);
                record.resumed_at = None;
                record.end_time = Some(now);
            }
        }
        let from = record.status;
        record.status = next;
        self.persist(&record).await?;

        tracing::info!(
            employee_id = %employee_id,
            break_id = %break_id,
            from = %from,
            to = %next,
            "Break transition"
        );
        Ok(record)
    }

    /// The employee's open break, if any (check-on-read)
    pub async fn active_break(&self, employee_id: &str) -> AppResult<Option<BreakRecord>> {
        Ok(self.open_breaks(employee_id).await?.into_iter().next())
    }

    /// Breaks started inside `window`, newest first
    pub async fn history(&self, employee_id: &str, window: ShiftWindow) -> AppResult<Vec<BreakRecord>> {
        let query = window_query(window).eq("employeeId", employee_id);
        Ok(document::find(self.store.as_ref(), &query).await?)
    }

    /// Every employee's breaks started inside `window`
    pub async fn all_in_window(&self, window: ShiftWindow) -> AppResult<Vec<BreakRecord>> {
        Ok(document::find(self.store.as_ref(), &window_query(window)).await?)
    }

    /// Complete every running break whose time is up; returns how many
    ///
    /// Employees with a transition in flight are picked up on the next tick.
    pub async fn tick(&self) -> AppResult<usize> {
        let query = Query::collection(collections::BREAKS).eq("status", BreakStatus::Active.as_str());
        let now = self.clock.now_millis();
        let running: Vec<BreakRecord> = document::find(self.store.as_ref(), &query).await?;

        let mut completed = 0;
        for record in running.into_iter().filter(|r| r.is_due(now)) {
            let Some(_guard) = self.locks.try_lock(&record.employee_id) else {
                continue;
            };
            let Some(id) = record.id.as_deref() else {
                continue;
            };
            // Re-read under the lock: it may have been paused meanwhile
            let current: Option<BreakRecord> = document::fetch(self.store.as_ref(), id).await?;
            if let Some(current) = current.filter(|r| r.is_due(self.clock.now_millis())) {
                self.finish_due(current).await?;
                completed += 1;
            }
        }
        Ok(completed)
    }
}

fn window_query(window: ShiftWindow) -> Query {
    Query::collection(collections::BREAKS)
        .filter("startTime", FilterOp::Ge, window.start)
        .filter("startTime", FilterOp::Lt, window.end)
        .order_by("startTime", Direction::Desc)
}

/// Drives automatic break completion once per tick
///
/// 注册为 `TaskKind::Periodic`。
pub struct BreakTicker {
    breaks: Arc<BreakService>,
    period: Duration,
    shutdown: CancellationToken,
}

impl BreakTicker {
    pub fn new(breaks: Arc<BreakService>, period: Duration, shutdown: CancellationToken) -> Self {
        Self {
            breaks,
            period,
            shutdown,
        }
    }

    pub async fn run(self) {
        tracing::info!(period_ms = self.period.as_millis() as u64, "Break ticker started");

        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.breaks.tick().await {
                        Ok(0) => {}
                        Ok(n) => tracing::debug!(completed = n, "Break tick"),
                        Err(e) => tracing::error!(error = %e, "Break tick failed"),
                    }
                }
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Break ticker received shutdown signal");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::models::AttendanceStatus;
    use crate::utils::ManualClock;

    const T0: i64 = 1_718_000_000_000;

    async fn clock_in(breaks: &BreakService, employee_id: &str) -> String {
        let record = AttendanceRecord {
            id: None,
            shift_id: format!("shift-{employee_id}"),
            cashier_id: employee_id.into(),
            clock_in_time: T0,
            clock_out_time: None,
            status: AttendanceStatus::Active,
            cashier_name: String::new(),
            cashier_email: String::new(),
        };
        document::insert(breaks.store.as_ref(), &record).await.unwrap()
    }

    /// e1 and e2 are on shift
    async fn setup() -> (Arc<BreakService>, Arc<ManualClock>) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let breaks = Arc::new(BreakService::new(store, clock.clone()));
        clock_in(&breaks, "e1").await;
        clock_in(&breaks, "e2").await;
        (breaks, clock)
    }

    #[tokio::test]
    async fn test_start_requires_open_attendance() {
        let (breaks, _clock) = setup().await;

        let err = breaks.start_break("e3", BreakType::Short).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotClockedIn);

        let attendance_id = clock_in(&breaks, "e3").await;
        document::patch::<AttendanceRecord>(
            breaks.store.as_ref(),
            &attendance_id,
            json!({ "status": "completed", "clockOutTime": T0 + 1 }),
        )
        .await
        .unwrap();
        let err = breaks.start_break("e3", BreakType::Short).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotClockedIn);

        assert!(breaks.start_break("e1", BreakType::Short).await.is_ok());
    }

    #[tokio::test]
    async fn test_second_start_rejected_while_open() {
        let (breaks, clock) = setup().await;
        let first = breaks.start_break("e1", BreakType::Short).await.unwrap();

        let err = breaks.start_break("e1", BreakType::Lunch).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BreakInProgress);

        let id = first.id.unwrap();
        breaks.pause_break("e1", &id).await.unwrap();
        let err = breaks.start_break("e1", BreakType::Lunch).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BreakInProgress);

        // other employees are independent
        assert!(breaks.start_break("e2", BreakType::Lunch).await.is_ok());

        breaks.cancel_break("e1", &id).await.unwrap();
        clock.advance_secs(1);
        assert!(breaks.start_break("e1", BreakType::Lunch).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_starts_create_one_break() {
        let (breaks, _clock) = setup().await;
        let a = tokio::spawn({
            let breaks = breaks.clone();
            async move { breaks.start_break("e1", BreakType::Short).await }
        });
        let b = tokio::spawn({
            let breaks = breaks.clone();
            async move { breaks.start_break("e1", BreakType::Extended).await }
        });
        let results = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    }

    #[tokio::test]
    async fn test_pause_keeps_position_across_reads() {
        let (breaks, clock) = setup().await;
        let id = breaks
            .start_break("e1", BreakType::Short)
            .await
            .unwrap()
            .id
            .unwrap();

        clock.advance_secs(120);
        let paused = breaks.pause_break("e1", &id).await.unwrap();
        assert_eq!(paused.elapsed_millis, 120_000);
        assert_eq!(paused.resumed_at, None);

        // time passes while paused, position is unchanged on a fresh read
        clock.advance_secs(600);
        let reloaded = breaks.active_break("e1").await.unwrap().unwrap();
        assert_eq!(reloaded.remaining_seconds(clock.now_millis()), 15 * 60 - 120);

        let resumed = breaks.resume_break("e1", &id).await.unwrap();
        clock.advance_secs(30);
        assert_eq!(resumed.elapsed_seconds_at(clock.now_millis()), 150);
    }

    #[tokio::test]
    async fn test_rapid_pause_resume_keeps_every_millisecond() {
        let (breaks, clock) = setup().await;
        let id = breaks
            .start_break("e1", BreakType::Short)
            .await
            .unwrap()
            .id
            .unwrap();

        for _ in 0..20 {
            clock.advance_millis(999);
            breaks.pause_break("e1", &id).await.unwrap();
            breaks.resume_break("e1", &id).await.unwrap();
        }
        let running = breaks.active_break("e1").await.unwrap().unwrap();
        assert_eq!(running.elapsed_millis, 19_980);
        assert_eq!(running.remaining_seconds(clock.now_millis()), 880);

        // the rest of the break still runs out on time
        clock.advance_millis(15 * 60_000 - 19_980);
        assert_eq!(breaks.tick().await.unwrap(), 1);
        assert!(breaks.active_break("e1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let (breaks, _clock) = setup().await;
        let id = breaks
            .start_break("e1", BreakType::Short)
            .await
            .unwrap()
            .id
            .unwrap();

        let err = breaks.resume_break("e1", &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BreakInvalidTransition);
        assert_eq!(err.message, "Invalid break transition from active to active");

        breaks.complete_break("e1", &id).await.unwrap();
        let err = breaks.cancel_break("e1", &id).await.unwrap_err();
        assert_eq!(err.message, "Invalid break transition from completed to cancelled");

        let err = breaks.pause_break("e1", "").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BreakIdRequired);

        let err = breaks.pause_break("e2", &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BreakNotFound);
    }

    #[tokio::test]
    async fn test_running_break_completes_on_read() {
        let (breaks, clock) = setup().await;
        breaks.start_break("e1", BreakType::Short).await.unwrap();

        clock.advance_secs(15 * 60 - 1);
        assert!(breaks.active_break("e1").await.unwrap().is_some());

        clock.advance_secs(1);
        assert!(breaks.active_break("e1").await.unwrap().is_none());

        let history = breaks
            .history("e1", ShiftWindow::new(T0, T0 + 86_400_000))
            .await
            .unwrap();
        assert_eq!(history[0].status, BreakStatus::Completed);
        assert_eq!(history[0].end_time, Some(T0 + 15 * 60_000));
    }

    #[tokio::test]
    async fn test_tick_completes_due_breaks_only() {
        let (breaks, clock) = setup().await;
        breaks.start_break("e1", BreakType::Short).await.unwrap();
        breaks.start_break("e2", BreakType::Lunch).await.unwrap();

        clock.advance_secs(15 * 60);
        assert_eq!(breaks.tick().await.unwrap(), 1);
        assert!(breaks.active_break("e1").await.unwrap().is_none());
        assert!(breaks.active_break("e2").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_completes_without_user_action() {
        let (breaks, clock) = setup().await;
        let id = breaks
            .start_break("e1", BreakType::Short)
            .await
            .unwrap()
            .id
            .unwrap();
        clock.advance_secs(15 * 60);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(
            BreakTicker::new(breaks.clone(), Duration::from_secs(1), shutdown.clone()).run(),
        );
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let record: BreakRecord = document::fetch(breaks.store.as_ref(), &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, BreakStatus::Completed);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
