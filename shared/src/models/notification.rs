//! Notification Model

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// In-app notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            title: title.into(),
            message: message.into(),
            read: false,
            created_at: now,
        }
    }
}
