//! Attendance Model (打卡)

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Attendance status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Active,
    Completed,
}

/// Clock-in / clock-out record for one shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub shift_id: String,
    pub cashier_id: String,
    pub clock_in_time: Timestamp,
    #[serde(default)]
    pub clock_out_time: Option<Timestamp>,
    pub status: AttendanceStatus,
    /// Snapshot taken at clock-in
    #[serde(default)]
    pub cashier_name: String,
    /// Snapshot taken at clock-in
    #[serde(default)]
    pub cashier_email: String,
}

impl AttendanceRecord {
    pub fn is_active(&self) -> bool {
        self.status == AttendanceStatus::Active
    }

    /// Worked millis, counting an open record up to `now`
    pub fn worked_millis(&self, now: Timestamp) -> i64 {
        let end = self.clock_out_time.unwrap_or(now);
        (end - self.clock_in_time).max(0)
    }
}

/// Clock-in payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockInRequest {
    pub shift_id: String,
}
