//! Role Models (角色 / 临时提权)
//!
//! A user's *base role* comes from the identity provider. A manager may
//! temporarily drop to cashier, and a cashier may be temporarily elevated
//! to manager after a request is approved. Both overrides are stored as a
//! [`RoleElevationRecord`] keyed by user id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{MINUTE_MILLIS, Timestamp};

/// Application role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Manager,
    Cashier,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Cashier => "cashier",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manager" => Ok(Self::Manager),
            "cashier" => Ok(Self::Cashier),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Temporary role override, one document per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleElevationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub base_role: UserRole,
    /// Override role, `None` once reverted
    pub temporary_role: Option<UserRole>,
    /// Expiry (Unix millis), `None` once reverted
    pub expires_at: Option<Timestamp>,
    /// Creation time (Unix millis)
    pub timestamp: Timestamp,
}

impl RoleElevationRecord {
    /// Build an override that ends `duration_minutes` after `now`
    pub fn elevated(
        user_id: impl Into<String>,
        base_role: UserRole,
        temporary_role: UserRole,
        now: Timestamp,
        duration_minutes: u32,
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            base_role,
            temporary_role: Some(temporary_role),
            expires_at: Some(now + i64::from(duration_minutes) * MINUTE_MILLIS),
            timestamp: now,
        }
    }

    /// Build a cleared record (no override)
    pub fn cleared(user_id: impl Into<String>, base_role: UserRole, now: Timestamp) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            base_role,
            temporary_role: None,
            expires_at: None,
            timestamp: now,
        }
    }

    /// Override present and not yet expired
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.temporary_role.is_some() && self.expires_at.is_some_and(|exp| now < exp)
    }

    /// Override present but logically expired (must be cleared by the reader)
    ///
    /// An override without an expiry violates the record invariant and is
    /// treated as expired.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.temporary_role.is_some() && self.expires_at.is_none_or(|exp| now >= exp)
    }

    /// Remaining override time in millis
    pub fn remaining_millis(&self, now: Timestamp) -> Option<i64> {
        if !self.is_active(now) {
            return None;
        }
        self.expires_at.map(|exp| exp - now)
    }
}

/// Role request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleRequestStatus {
    Pending,
    Approved,
    Denied,
}

impl RoleRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
        }
    }
}

/// Elevation request, one document per user (a new request overwrites)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub base_role: UserRole,
    /// Always [`UserRole::Manager`]
    pub requested_role: UserRole,
    pub reason: String,
    pub status: RoleRequestStatus,
    pub timestamp: Timestamp,
    /// Elevation expiry, set on approval
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    /// Manager who approved or denied the request
    #[serde(default)]
    pub decided_by: Option<String>,
}

impl RoleRequest {
    pub fn pending(
        user_id: impl Into<String>,
        base_role: UserRole,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            base_role,
            requested_role: UserRole::Manager,
            reason: reason.into(),
            status: RoleRequestStatus::Pending,
            timestamp: now,
            expires_at: None,
            decided_by: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RoleRequestStatus::Pending
    }
}

/// Elevation duration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevationDuration {
    pub duration_minutes: u32,
}

/// Role elevation request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRequestCreate {
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde() {
        assert_eq!(
            serde_json::to_string(&UserRole::Manager).unwrap(),
            "\"manager\""
        );
        let role: UserRole = serde_json::from_str("\"cashier\"").unwrap();
        assert_eq!(role, UserRole::Cashier);
        assert_eq!("Manager".parse::<UserRole>().unwrap(), UserRole::Manager);
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_elevation_expiry_window() {
        let now = 1_000_000;
        let record =
            RoleElevationRecord::elevated("u1", UserRole::Manager, UserRole::Cashier, now, 30);
        assert_eq!(record.expires_at, Some(now + 30 * 60_000));
        assert!(record.is_active(now));
        assert!(!record.is_expired(now));
        assert_eq!(record.remaining_millis(now + 60_000), Some(29 * 60_000));

        let at_expiry = now + 30 * 60_000;
        assert!(!record.is_active(at_expiry));
        assert!(record.is_expired(at_expiry));
        assert_eq!(record.remaining_millis(at_expiry), None);
    }

    #[test]
    fn test_cleared_record_is_neither_active_nor_expired() {
        let record = RoleElevationRecord::cleared("u1", UserRole::Cashier, 5);
        assert!(!record.is_active(10));
        assert!(!record.is_expired(10));
    }

    #[test]
    fn test_override_without_expiry_counts_as_expired() {
        let mut record =
            RoleElevationRecord::elevated("u1", UserRole::Cashier, UserRole::Manager, 0, 60);
        record.expires_at = None;
        assert!(record.is_expired(0));
    }

    #[test]
    fn test_record_uses_camel_case_and_skips_missing_id() {
        let record =
            RoleElevationRecord::elevated("u1", UserRole::Cashier, UserRole::Manager, 0, 60);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["temporaryRole"], "manager");
        assert_eq!(value["expiresAt"], 3_600_000);
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_pending_request() {
        let request = RoleRequest::pending("u2", UserRole::Cashier, "need override", 7);
        assert!(request.is_pending());
        assert_eq!(request.requested_role, UserRole::Manager);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["requestedRole"], "manager");
    }
}
