//! Shift Analytics (周统计)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::breaks::BreakType;
use super::shift::ShiftWindow;

/// Totals over one week window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftAnalytics {
    pub window: ShiftWindow,
    pub total_shifts: usize,
    pub active_shifts: usize,
    pub completed_shifts: usize,
    pub scheduled_hours: f64,
    pub worked_hours: f64,
    /// Share of shifts with at least one clock-in (0.0 - 1.0)
    pub attendance_rate: f64,
    pub total_break_minutes: i64,
    pub breaks_by_type: BTreeMap<BreakType, usize>,
}
