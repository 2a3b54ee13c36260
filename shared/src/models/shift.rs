//! Shift Model (排班)

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Shift status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    #[default]
    Active,
    Completed,
}

/// Scheduled work shift assigned to one employee
///
/// `cashier_name` / `cashier_email` are a point-in-time snapshot of the
/// employee taken when the shift was created or last updated. They are not
/// kept in sync with later profile changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub employee_id: String,
    /// Scheduled start (Unix millis)
    pub start_time: Timestamp,
    /// Scheduled end (Unix millis)
    pub end_time: Timestamp,
    #[serde(default)]
    pub status: ShiftStatus,
    #[serde(default)]
    pub cashier_name: String,
    #[serde(default)]
    pub cashier_email: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl Shift {
    /// `now` falls inside `[start_time, end_time]`
    pub fn contains(&self, now: Timestamp) -> bool {
        now >= self.start_time && now <= self.end_time
    }

    /// Scheduled length in millis
    pub fn duration_millis(&self) -> i64 {
        (self.end_time - self.start_time).max(0)
    }
}

/// Create shift payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftCreate {
    pub employee_id: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub notes: Option<String>,
}

/// Update shift payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftUpdate {
    pub employee_id: Option<String>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub status: Option<ShiftStatus>,
    pub notes: Option<String>,
}

/// Half-open time window `[start, end)` in Unix millis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl ShiftWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts < self.end
    }
}
