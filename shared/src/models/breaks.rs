//! Break Model (休息)
//!
//! The timer position of a break is persisted, never held by the client:
//! `elapsed_millis` counts the finished running segments and `resumed_at`
//! marks the start of the segment currently running (`None` while paused).
//! Time is kept in milliseconds and only rounded down to seconds for display.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Timestamp;

/// Break type with its fixed length
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BreakType {
    Short,
    Lunch,
    Extended,
}

impl BreakType {
    /// Length in minutes
    pub fn minutes(&self) -> u32 {
        match self {
            Self::Short => 15,
            Self::Lunch => 30,
            Self::Extended => 45,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "SHORT",
            Self::Lunch => "LUNCH",
            Self::Extended => "EXTENDED",
        }
    }
}

/// Break status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakStatus {
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl BreakStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Allowed edges: active -> {paused, completed, cancelled},
    /// paused -> {active, completed, cancelled}
    pub fn can_transition_to(&self, next: BreakStatus) -> bool {
        match (self, next) {
            (Self::Active, Self::Paused) | (Self::Paused, Self::Active) => true,
            (Self::Active | Self::Paused, Self::Completed | Self::Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for BreakStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Break session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub employee_id: String,
    #[serde(rename = "type")]
    pub break_type: BreakType,
    pub start_time: Timestamp,
    #[serde(default)]
    pub end_time: Option<Timestamp>,
    /// Length in minutes
    pub duration: u32,
    pub status: BreakStatus,
    /// Milliseconds accumulated before the running segment
    #[serde(default)]
    pub elapsed_millis: i64,
    /// Start of the running segment
    #[serde(default)]
    pub resumed_at: Option<Timestamp>,
}

impl BreakRecord {
    /// New running break
    pub fn start(employee_id: impl Into<String>, break_type: BreakType, now: Timestamp) -> Self {
        Self {
            id: None,
            employee_id: employee_id.into(),
            break_type,
            start_time: now,
            end_time: None,
            duration: break_type.minutes(),
            status: BreakStatus::Active,
            elapsed_millis: 0,
            resumed_at: Some(now),
        }
    }

    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn total_seconds(&self) -> i64 {
        i64::from(self.duration) * 60
    }

    pub fn total_millis(&self) -> i64 {
        self.total_seconds() * 1000
    }

    /// Elapsed break time at `now` in milliseconds, capped at the break length
    pub fn elapsed_millis_at(&self, now: Timestamp) -> i64 {
        let running = match (self.status, self.resumed_at) {
            (BreakStatus::Active, Some(resumed)) => (now - resumed).max(0),
            _ => 0,
        };
        (self.elapsed_millis + running).min(self.total_millis())
    }

    /// Whole elapsed seconds at `now`
    pub fn elapsed_seconds_at(&self, now: Timestamp) -> i64 {
        self.elapsed_millis_at(now) / 1000
    }

    /// Countdown for display, whole seconds rounded down
    pub fn remaining_seconds(&self, now: Timestamp) -> i64 {
        (self.total_millis() - self.elapsed_millis_at(now)).max(0) / 1000
    }

    /// Running and out of time
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.status == BreakStatus::Active && self.elapsed_millis_at(now) >= self.total_millis()
    }
}

/// Break state change as reported back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakTransition {
    pub employee_id: String,
    /// Absent for a newly started session until the store assigns it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_id: Option<String>,
    pub status: BreakStatus,
}

/// Start break payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakStart {
    #[serde(rename = "type")]
    pub break_type: BreakType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_lengths() {
        assert_eq!(BreakType::Short.minutes(), 15);
        assert_eq!(BreakType::Lunch.minutes(), 30);
        assert_eq!(BreakType::Extended.minutes(), 45);
        assert_eq!(serde_json::to_string(&BreakType::Lunch).unwrap(), "\"LUNCH\"");
    }

    #[test]
    fn test_transitions() {
        use BreakStatus::*;
        assert!(Active.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Active));
        assert!(Paused.can_transition_to(Completed));
        assert!(Active.can_transition_to(Cancelled));
        assert!(!Active.can_transition_to(Active));
        assert!(!Completed.can_transition_to(Active));
        assert!(!Cancelled.can_transition_to(Paused));
    }

    #[test]
    fn test_elapsed_across_pause() {
        let mut record = BreakRecord::start("e1", BreakType::Short, 0);
        assert_eq!(record.elapsed_seconds_at(120_000), 120);

        // paused at 2 minutes
        record.status = BreakStatus::Paused;
        record.elapsed_millis = 120_000;
        record.resumed_at = None;
        assert_eq!(record.elapsed_seconds_at(600_000), 120);
        assert_eq!(record.remaining_seconds(600_000), 780);

        // resumed at 10 minutes
        record.status = BreakStatus::Active;
        record.resumed_at = Some(600_000);
        assert_eq!(record.elapsed_seconds_at(660_000), 180);
        assert!(!record.is_due(660_000));
        assert!(record.is_due(600_000 + 780_000));
    }

    #[test]
    fn test_sub_second_segments_accumulate() {
        let mut record = BreakRecord::start("e1", BreakType::Short, 0);
        let mut now = 0;
        for _ in 0..20 {
            now += 999;
            // pause folds the segment in, resume starts a new one
            record.elapsed_millis = record.elapsed_millis_at(now);
            record.resumed_at = Some(now);
        }
        assert_eq!(record.elapsed_millis, 19_980);
        assert_eq!(record.elapsed_seconds_at(now), 19);
        assert_eq!(record.remaining_seconds(now), 880);

        // 最后不足一秒也计入
        assert!(!record.is_due(15 * 60_000 - 1));
        assert!(record.is_due(15 * 60_000));
    }

    #[test]
    fn test_type_field_name() {
        let record = BreakRecord::start("e1", BreakType::Extended, 5);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "EXTENDED");
        assert_eq!(value["duration"], 45);
        assert_eq!(value["resumedAt"], 5);
    }
}
