//! In-app notifications
//!
//! Written as a side effect of role and shift operations. Delivery is
//! best-effort: a failed notification is logged and never fails the
//! operation that triggered it.

use std::sync::Arc;

use shared::models::{Notification, UserProfile, UserRole};

use crate::store::document::{self, collections};
use crate::store::{DocumentStore, Query};
use crate::utils::{AppError, AppResult, Clock, ErrorCode};

#[derive(Debug, Clone)]
pub struct NotificationService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Best-effort single notification
    pub async fn notify(&self, user_id: &str, title: &str, message: &str) {
        let notification = Notification::new(user_id, title, message, self.clock.now_millis());
        if let Err(e) = document::insert(self.store.as_ref(), &notification).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to write notification");
        }
    }

    /// Best-effort notification to every user whose base role is `role`
    pub async fn notify_role(&self, role: UserRole, title: &str, message: &str) {
        let query = Query::collection(collections::USERS).eq("role", role.as_str());
        let users: Vec<UserProfile> = match document::find(self.store.as_ref(), &query).await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(role = %role, error = %e, "Failed to look up notification recipients");
                return;
            }
        };
        for user in users {
            if let Some(id) = user.id.as_deref() {
                self.notify(id, title, message).await;
            }
        }
    }

    pub async fn list_unread(&self, user_id: &str) -> AppResult<Vec<Notification>> {
        let query = Query::collection(collections::NOTIFICATIONS)
            .eq("userId", user_id)
            .eq("read", false);
        let mut unread: Vec<Notification> = document::find(self.store.as_ref(), &query).await?;
        unread.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(unread)
    }

    /// Mark one of the user's own notifications as read
    pub async fn mark_read(&self, user_id: &str, notification_id: &str) -> AppResult<()> {
        let notification: Notification = document::fetch(self.store.as_ref(), notification_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::NotificationNotFound))?;
        if notification.user_id != user_id {
            // Do not reveal other users' notifications
            return Err(AppError::new(ErrorCode::NotificationNotFound));
        }
        document::patch::<Notification>(
            self.store.as_ref(),
            notification_id,
            serde_json::json!({ "read": true }),
        )
        .await?;
        Ok(())
    }
}
