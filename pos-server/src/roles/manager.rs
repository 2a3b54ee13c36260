//! Role elevation manager
//!
//! Owns the per-user override record and the elevation request. Expiry is
//! enforced on every read (`effective_role`, `rehydrate`) and by the
//! background sweeper, never by a timer tied to a session.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;

use shared::models::{RoleElevationRecord, RoleRequest, RoleRequestStatus, UserRole};

use crate::auth::CurrentUser;
use crate::notifications::NotificationService;
use crate::security_log;
use crate::store::document::{self, collections};
use crate::store::{Direction, DocumentStore, FilterOp, Query};
use crate::utils::validation::{MAX_NOTE_LEN, validate_required_text};
use crate::utils::{AppError, AppResult, Clock, ErrorCode};

use super::route_guard::MANAGER_HOME;

/// Durations (minutes) accepted for a temporary role
pub const ALLOWED_DURATIONS: [u32; 4] = [30, 60, 120, 240];

/// Role state of one user as seen by clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSession {
    pub user_id: String,
    pub base_role: UserRole,
    pub temporary_role: Option<UserRole>,
    pub effective_role: UserRole,
    pub is_temporary_role: bool,
    pub expires_at: Option<i64>,
    pub remaining_millis: Option<i64>,
    /// Outstanding (pending) elevation request
    pub role_request: Option<RoleRequest>,
    /// Another role operation for this user is in flight
    pub is_loading: bool,
}

impl RoleSession {
    fn base(user: &CurrentUser) -> Self {
        Self {
            user_id: user.id.clone(),
            base_role: user.role,
            temporary_role: None,
            effective_role: user.role,
            is_temporary_role: false,
            expires_at: None,
            remaining_millis: None,
            role_request: None,
            is_loading: false,
        }
    }

    fn with_record(mut self, record: &RoleElevationRecord, now: i64) -> Self {
        if record.is_active(now) {
            self.temporary_role = record.temporary_role;
            self.effective_role = record.temporary_role.unwrap_or(self.base_role);
            self.is_temporary_role = true;
            self.expires_at = record.expires_at;
            self.remaining_millis = record.remaining_millis(now);
        }
        self
    }
}

/// Result of a switch / revert: the new session and where the client goes
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleTransition {
    pub session: RoleSession,
    pub redirect_to: &'static str,
}

/// Marks a user as busy for the lifetime of the guard
struct InFlight<'a> {
    map: &'a DashMap<String, ()>,
    key: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.map.remove(&self.key);
    }
}

#[derive(Debug)]
pub struct RoleElevationManager {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    notifications: NotificationService,
    in_flight: DashMap<String, ()>,
}

impl RoleElevationManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            store,
            clock,
            notifications,
            in_flight: DashMap::new(),
        }
    }

    fn begin(&self, user_id: &str) -> AppResult<InFlight<'_>> {
        if self.in_flight.insert(user_id.to_string(), ()).is_some() {
            return Err(AppError::new(ErrorCode::RoleOperationInProgress));
        }
        Ok(InFlight {
            map: &self.in_flight,
            key: user_id.to_string(),
        })
    }

    fn validate_duration(duration_minutes: u32) -> AppResult<()> {
        if ALLOWED_DURATIONS.contains(&duration_minutes) {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::InvalidElevationDuration)
                .with_detail("durationMinutes", duration_minutes))
        }
    }

    async fn load_record(&self, user_id: &str) -> AppResult<Option<RoleElevationRecord>> {
        Ok(document::fetch(self.store.as_ref(), user_id).await?)
    }

    /// Effective role with expiry checked on read
    pub async fn effective_role(&self, user: &CurrentUser) -> AppResult<UserRole> {
        let now = self.clock.now_millis();
        let role = match self.load_record(&user.id).await? {
            Some(record) if record.is_active(now) => record.temporary_role.unwrap_or(user.role),
            _ => user.role,
        };
        Ok(role)
    }

    async fn require_effective_manager(&self, user: &CurrentUser) -> AppResult<()> {
        if self.effective_role(user).await? != UserRole::Manager {
            security_log!(
                "WARN",
                "role_elevation_denied",
                user_id = user.id.clone(),
                reason = "manager role required"
            );
            return Err(AppError::role_required(UserRole::Manager.as_str()));
        }
        Ok(())
    }

    /// Ask for a temporary manager role; overwrites any previous request
    pub async fn request_role_elevation(
        &self,
        user: &CurrentUser,
        reason: &str,
    ) -> AppResult<RoleRequest> {
        validate_required_text(reason, "Reason", MAX_NOTE_LEN)?;
        let _guard = self.begin(&user.id)?;

        let now = self.clock.now_millis();
        let mut request = RoleRequest::pending(&user.id, user.role, reason.trim(), now);
        document::put(self.store.as_ref(), &user.id, &request)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Failed to write role request");
                AppError::from(e)
            })?;
        request.id = Some(user.id.clone());

        security_log!("INFO", "role_elevation_requested", user_id = user.id.clone());
        self.notifications
            .notify_role(
                UserRole::Manager,
                "Role elevation request",
                &format!("{} requested manager access: {}", display_name(user), request.reason),
            )
            .await;

        Ok(request)
    }

    /// Manager temporarily operates as cashier
    pub async fn switch_to_cashier_role(
        &self,
        user: &CurrentUser,
        duration_minutes: u32,
    ) -> AppResult<RoleTransition> {
        if user.role != UserRole::Manager {
            return Err(AppError::role_required(UserRole::Manager.as_str()));
        }
        Self::validate_duration(duration_minutes)?;
        let _guard = self.begin(&user.id)?;

        let now = self.clock.now_millis();
        let record = RoleElevationRecord::elevated(
            &user.id,
            user.role,
            UserRole::Cashier,
            now,
            duration_minutes,
        );
        document::put(self.store.as_ref(), &user.id, &record)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Failed to switch to cashier role");
                AppError::from(e)
            })?;

        security_log!(
            "INFO",
            "role_switched_to_cashier",
            user_id = user.id.clone(),
            duration_minutes = duration_minutes
        );

        Ok(RoleTransition {
            session: RoleSession::base(user).with_record(&record, now),
            redirect_to: MANAGER_HOME,
        })
    }

    /// Close a pending request and grant the role in one atomic batch
    pub async fn approve_role_request(
        &self,
        manager: &CurrentUser,
        user_id: &str,
        duration_minutes: u32,
    ) -> AppResult<RoleRequest> {
        self.require_effective_manager(manager).await?;
        Self::validate_duration(duration_minutes)?;
        let _guard = self.begin(user_id)?;

        let mut request = self.load_pending(user_id).await?;
        let now = self.clock.now_millis();
        let record = RoleElevationRecord::elevated(
            user_id,
            request.base_role,
            request.requested_role,
            now,
            duration_minutes,
        );
        request.status = RoleRequestStatus::Approved;
        request.expires_at = record.expires_at;
        request.decided_by = Some(manager.id.clone());

        let ops = vec![
            document::put_op(user_id, &request)?,
            document::put_op(user_id, &record)?,
        ];
        self.store.commit(ops).await.map_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "Failed to approve role request");
            AppError::from(e)
        })?;

        security_log!(
            "INFO",
            "role_elevation_approved",
            user_id = user_id.to_string(),
            approved_by = manager.id.clone(),
            duration_minutes = duration_minutes
        );
        self.notifications
            .notify(
                user_id,
                "Role elevation approved",
                &format!("Manager access granted for {duration_minutes} minutes"),
            )
            .await;

        Ok(request)
    }

    pub async fn deny_role_request(
        &self,
        manager: &CurrentUser,
        user_id: &str,
    ) -> AppResult<RoleRequest> {
        self.require_effective_manager(manager).await?;
        let _guard = self.begin(user_id)?;

        let mut request = self.load_pending(user_id).await?;
        request.status = RoleRequestStatus::Denied;
        request.decided_by = Some(manager.id.clone());
        document::put(self.store.as_ref(), user_id, &request).await?;

        security_log!(
            "INFO",
            "role_elevation_denied",
            user_id = user_id.to_string(),
            denied_by = manager.id.clone()
        );
        self.notifications
            .notify(user_id, "Role elevation denied", "Your request for manager access was denied")
            .await;

        Ok(request)
    }

    async fn load_pending(&self, user_id: &str) -> AppResult<RoleRequest> {
        let request: RoleRequest = document::fetch(self.store.as_ref(), user_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::RoleRequestNotFound))?;
        if !request.is_pending() {
            return Err(AppError::new(ErrorCode::RoleRequestNotPending)
                .with_detail("status", request.status.as_str()));
        }
        Ok(request)
    }

    /// Pending requests, oldest first
    pub async fn list_pending_requests(&self, manager: &CurrentUser) -> AppResult<Vec<RoleRequest>> {
        self.require_effective_manager(manager).await?;
        let query = Query::collection(collections::ROLE_REQUESTS)
            .eq("status", RoleRequestStatus::Pending.as_str())
            .order_by("timestamp", Direction::Asc);
        Ok(document::find(self.store.as_ref(), &query).await?)
    }

    /// Drop any temporary role; idempotent
    pub async fn revert_to_base_role(&self, user: &CurrentUser) -> AppResult<RoleTransition> {
        let _guard = self.begin(&user.id)?;
        self.clear_record(&user.id, user.role).await?;
        security_log!("INFO", "role_reverted", user_id = user.id.clone());
        Ok(RoleTransition {
            session: RoleSession::base(user),
            redirect_to: MANAGER_HOME,
        })
    }

    async fn clear_record(&self, user_id: &str, base_role: UserRole) -> AppResult<()> {
        let cleared = RoleElevationRecord::cleared(user_id, base_role, self.clock.now_millis());
        document::put(self.store.as_ref(), user_id, &cleared)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user_id, error = %e, "Failed to revert role");
                AppError::from(e)
            })
    }

    /// Session state at login / reload
    ///
    /// An expired override is cleared immediately; a pending request is
    /// returned for display.
    pub async fn rehydrate(&self, user: &CurrentUser) -> AppResult<RoleSession> {
        let store = self.store.as_ref();
        let (record, request) = futures::try_join!(
            document::fetch::<RoleElevationRecord>(store, &user.id),
            document::fetch::<RoleRequest>(store, &user.id),
        )?;

        let now = self.clock.now_millis();
        let mut session = RoleSession::base(user);
        session.is_loading = self.in_flight.contains_key(&user.id);

        if let Some(record) = record {
            if record.is_expired(now) {
                tracing::info!(user_id = %user.id, "Temporary role expired, reverting");
                self.clear_record(&user.id, user.role).await?;
            } else {
                session = session.with_record(&record, now);
            }
        }
        session.role_request = request.filter(|r| r.is_pending());

        Ok(session)
    }

    /// Revert every expired override; returns how many were cleared
    ///
    /// Users with a role operation in flight are skipped until the next pass.
    pub async fn sweep_expired(&self) -> AppResult<usize> {
        let now = self.clock.now_millis();
        let query = Query::collection(collections::ROLE_ELEVATIONS).filter(
            "temporaryRole",
            FilterOp::Ne,
            serde_json::Value::Null,
        );
        let records: Vec<RoleElevationRecord> = document::find(self.store.as_ref(), &query).await?;

        let mut reverted = 0;
        for record in records.into_iter().filter(|r| r.is_expired(now)) {
            let Ok(_guard) = self.begin(&record.user_id) else {
                continue;
            };
            // Re-read under the guard: a switch may have renewed it
            match self.load_record(&record.user_id).await? {
                Some(current) if current.is_expired(self.clock.now_millis()) => {
                    self.clear_record(&record.user_id, current.base_role).await?;
                    security_log!(
                        "INFO",
                        "role_expired",
                        user_id = record.user_id.clone()
                    );
                    reverted += 1;
                }
                _ => {}
            }
        }
        Ok(reverted)
    }
}

fn display_name(user: &CurrentUser) -> &str {
    if user.name.is_empty() { &user.email } else { &user.name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ChangeEvent, MemoryStore, StoreError, StoreResult, StoredDocument, WriteOp};
    use crate::utils::ManualClock;
    use async_trait::async_trait;
    use serde_json::Value;
    use shared::models::UserProfile;
    use tokio::sync::broadcast;

    const T0: i64 = 1_718_000_000_000;

    fn user(id: &str, role: UserRole) -> CurrentUser {
        CurrentUser {
            id: id.into(),
            email: format!("{id}@example.com"),
            name: id.into(),
            role,
        }
    }

    fn setup_with(store: Arc<dyn DocumentStore>) -> (RoleElevationManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(T0));
        let notifications = NotificationService::new(store.clone(), clock.clone());
        (
            RoleElevationManager::new(store, clock.clone(), notifications),
            clock,
        )
    }

    fn setup() -> (RoleElevationManager, Arc<ManualClock>, Arc<dyn DocumentStore>) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let (manager, clock) = setup_with(store.clone());
        (manager, clock, store)
    }

    #[tokio::test]
    async fn test_switch_sets_expiry_for_each_allowed_duration() {
        let (roles, _clock, store) = setup();
        let manager = user("m1", UserRole::Manager);

        for d in ALLOWED_DURATIONS {
            let transition = roles.switch_to_cashier_role(&manager, d).await.unwrap();
            assert_eq!(transition.redirect_to, "/dashboard");
            assert_eq!(transition.session.effective_role, UserRole::Cashier);

            let record: RoleElevationRecord = document::fetch(store.as_ref(), "m1")
                .await
                .unwrap()
                .unwrap();
            let expected = T0 + i64::from(d) * 60_000;
            assert!((record.expires_at.unwrap() - expected).abs() <= 1_000);
            assert_eq!(record.temporary_role, Some(UserRole::Cashier));
        }
    }

    #[tokio::test]
    async fn test_switch_rejects_cashier_and_odd_durations() {
        let (roles, _clock, _store) = setup();
        let err = roles
            .switch_to_cashier_role(&user("c1", UserRole::Cashier), 30)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequired);

        let err = roles
            .switch_to_cashier_role(&user("m1", UserRole::Manager), 45)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidElevationDuration);
    }

    #[tokio::test]
    async fn test_rehydrate_after_expiry_reverts_without_sweeper() {
        let (roles, clock, store) = setup();
        let manager = user("m1", UserRole::Manager);
        roles.switch_to_cashier_role(&manager, 30).await.unwrap();

        clock.advance_millis(10 * 60_000);
        let session = roles.rehydrate(&manager).await.unwrap();
        assert!(session.is_temporary_role);
        assert_eq!(session.remaining_millis, Some(20 * 60_000));

        clock.advance_millis(20 * 60_000);
        let session = roles.rehydrate(&manager).await.unwrap();
        assert_eq!(session.effective_role, UserRole::Manager);
        assert!(!session.is_temporary_role);

        let record: RoleElevationRecord = document::fetch(store.as_ref(), "m1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.temporary_role, None);
        assert_eq!(record.expires_at, None);
    }

    #[tokio::test]
    async fn test_effective_role_ignores_expired_override() {
        let (roles, clock, _store) = setup();
        let manager = user("m1", UserRole::Manager);
        roles.switch_to_cashier_role(&manager, 60).await.unwrap();
        assert_eq!(roles.effective_role(&manager).await.unwrap(), UserRole::Cashier);

        clock.advance_millis(60 * 60_000);
        assert_eq!(roles.effective_role(&manager).await.unwrap(), UserRole::Manager);
    }

    #[tokio::test]
    async fn test_request_then_approve() {
        let (roles, _clock, store) = setup();
        let cashier = user("c1", UserRole::Cashier);
        let manager = user("m1", UserRole::Manager);

        let request = roles
            .request_role_elevation(&cashier, "need override")
            .await
            .unwrap();
        assert!(request.is_pending());

        let session = roles.rehydrate(&cashier).await.unwrap();
        assert_eq!(session.role_request.map(|r| r.reason), Some("need override".into()));

        let approved = roles.approve_role_request(&manager, "c1", 60).await.unwrap();
        assert_eq!(approved.status, RoleRequestStatus::Approved);
        assert_eq!(approved.decided_by.as_deref(), Some("m1"));

        let stored: RoleRequest = document::fetch(store.as_ref(), "c1").await.unwrap().unwrap();
        assert_eq!(stored.status, RoleRequestStatus::Approved);
        let record: RoleElevationRecord =
            document::fetch(store.as_ref(), "c1").await.unwrap().unwrap();
        assert_eq!(record.temporary_role, Some(UserRole::Manager));
        assert!((record.expires_at.unwrap() - (T0 + 3_600_000)).abs() <= 1_000);

        assert_eq!(roles.effective_role(&cashier).await.unwrap(), UserRole::Manager);

        // second approval of the same request
        let err = roles.approve_role_request(&manager, "c1", 60).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequestNotPending);
    }

    #[tokio::test]
    async fn test_request_rejects_empty_reason_and_overwrites() {
        let (roles, clock, store) = setup();
        let cashier = user("c1", UserRole::Cashier);
        assert!(roles.request_role_elevation(&cashier, "  ").await.is_err());

        roles.request_role_elevation(&cashier, "first").await.unwrap();
        clock.advance_secs(5);
        roles.request_role_elevation(&cashier, "second").await.unwrap();

        let pending = roles
            .list_pending_requests(&user("m1", UserRole::Manager))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].reason, "second");
        assert_eq!(pending[0].id.as_deref(), Some("c1"));

        let stored: RoleRequest = document::fetch(store.as_ref(), "c1").await.unwrap().unwrap();
        assert_eq!(stored.timestamp, T0 + 5_000);
    }

    #[tokio::test]
    async fn test_request_notifies_managers() {
        let (roles, _clock, store) = setup();
        let profile = UserProfile {
            id: None,
            name: "Mia".into(),
            email: "mia@example.com".into(),
            role: UserRole::Manager,
        };
        document::put(store.as_ref(), "m1", &profile).await.unwrap();

        roles
            .request_role_elevation(&user("c1", UserRole::Cashier), "till stuck")
            .await
            .unwrap();

        let notes = roles.notifications.list_unread("m1").await.unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.contains("till stuck"));
    }

    #[tokio::test]
    async fn test_only_effective_managers_approve_or_deny() {
        let (roles, _clock, _store) = setup();
        let cashier = user("c1", UserRole::Cashier);
        roles.request_role_elevation(&cashier, "please").await.unwrap();

        let other_cashier = user("c2", UserRole::Cashier);
        let err = roles
            .approve_role_request(&other_cashier, "c1", 60)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequired);

        // a manager operating as cashier is not a manager
        let manager = user("m1", UserRole::Manager);
        roles.switch_to_cashier_role(&manager, 30).await.unwrap();
        let err = roles.deny_role_request(&manager, "c1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequired);

        roles.revert_to_base_role(&manager).await.unwrap();
        let denied = roles.deny_role_request(&manager, "c1").await.unwrap();
        assert_eq!(denied.status, RoleRequestStatus::Denied);
        assert!(roles.rehydrate(&cashier).await.unwrap().role_request.is_none());
    }

    #[tokio::test]
    async fn test_approve_missing_request() {
        let (roles, _clock, _store) = setup();
        let err = roles
            .approve_role_request(&user("m1", UserRole::Manager), "ghost", 60)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequestNotFound);
    }

    #[tokio::test]
    async fn test_revert_is_idempotent() {
        let (roles, _clock, _store) = setup();
        let manager = user("m1", UserRole::Manager);
        roles.switch_to_cashier_role(&manager, 120).await.unwrap();

        let first = roles.revert_to_base_role(&manager).await.unwrap();
        let second = roles.revert_to_base_role(&manager).await.unwrap();
        assert_eq!(first.session, second.session);
        assert_eq!(first.session.effective_role, UserRole::Manager);
    }

    #[tokio::test]
    async fn test_in_flight_guard_rejects_overlap() {
        let (roles, _clock, _store) = setup();
        let guard = roles.begin("m1").unwrap();
        let err = roles
            .switch_to_cashier_role(&user("m1", UserRole::Manager), 30)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleOperationInProgress);

        let session = roles.rehydrate(&user("m1", UserRole::Manager)).await.unwrap();
        assert!(session.is_loading);

        drop(guard);
        assert!(
            roles
                .switch_to_cashier_role(&user("m1", UserRole::Manager), 30)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_sweep_reverts_only_expired() {
        let (roles, clock, store) = setup();
        roles
            .switch_to_cashier_role(&user("m1", UserRole::Manager), 30)
            .await
            .unwrap();
        roles
            .switch_to_cashier_role(&user("m2", UserRole::Manager), 240)
            .await
            .unwrap();

        clock.advance_millis(31 * 60_000);
        assert_eq!(roles.sweep_expired().await.unwrap(), 1);
        assert_eq!(roles.sweep_expired().await.unwrap(), 0);

        let m1: RoleElevationRecord = document::fetch(store.as_ref(), "m1").await.unwrap().unwrap();
        let m2: RoleElevationRecord = document::fetch(store.as_ref(), "m2").await.unwrap().unwrap();
        assert_eq!(m1.temporary_role, None);
        assert_eq!(m2.temporary_role, Some(UserRole::Cashier));
    }

    /// Delegates to a memory store but fails every batch commit
    #[derive(Debug, Default)]
    struct FailingCommitStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl DocumentStore for FailingCommitStore {
        async fn get(&self, c: &str, id: &str) -> StoreResult<Option<StoredDocument>> {
            self.inner.get(c, id).await
        }
        async fn set(&self, c: &str, id: &str, data: Value, merge: bool) -> StoreResult<()> {
            self.inner.set(c, id, data, merge).await
        }
        async fn add(&self, c: &str, data: Value) -> StoreResult<String> {
            self.inner.add(c, data).await
        }
        async fn update(&self, c: &str, id: &str, data: Value) -> StoreResult<()> {
            self.inner.update(c, id, data).await
        }
        async fn delete(&self, c: &str, id: &str) -> StoreResult<()> {
            self.inner.delete(c, id).await
        }
        async fn query(&self, q: &Query) -> StoreResult<Vec<StoredDocument>> {
            self.inner.query(q).await
        }
        async fn commit(&self, _ops: Vec<WriteOp>) -> StoreResult<()> {
            Err(StoreError::Backend("injected commit failure".into()))
        }
        fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
            self.inner.changes()
        }
    }

    #[tokio::test]
    async fn test_failed_approval_leaves_no_partial_state() {
        let store: Arc<dyn DocumentStore> = Arc::new(FailingCommitStore::default());
        let (roles, _clock) = setup_with(store.clone());
        let cashier = user("c1", UserRole::Cashier);

        roles.request_role_elevation(&cashier, "need override").await.unwrap();
        let err = roles
            .approve_role_request(&user("m1", UserRole::Manager), "c1", 60)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);

        let request: RoleRequest = document::fetch(store.as_ref(), "c1").await.unwrap().unwrap();
        assert!(request.is_pending());
        let record: Option<RoleElevationRecord> = document::fetch(store.as_ref(), "c1").await.unwrap();
        assert!(record.is_none());
        assert_eq!(roles.effective_role(&cashier).await.unwrap(), UserRole::Cashier);
    }
}
