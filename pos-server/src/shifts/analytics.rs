//! 周统计 (manager dashboard)

use std::collections::{BTreeMap, HashSet};

use shared::models::{
    AttendanceRecord, BreakRecord, BreakStatus, Shift, ShiftAnalytics, ShiftStatus, ShiftWindow,
};

const HOUR_MILLIS: f64 = 3_600_000.0;

fn hours(millis: i64) -> f64 {
    (millis as f64 / HOUR_MILLIS * 100.0).round() / 100.0
}

/// Aggregate one window's shifts, attendance and breaks
///
/// Open attendance and running breaks are counted up to `now`. Cancelled
/// breaks are ignored.
pub fn compute_analytics(
    window: ShiftWindow,
    shifts: &[Shift],
    attendance: &[AttendanceRecord],
    breaks: &[BreakRecord],
    now: i64,
) -> ShiftAnalytics {
    let active_shifts = shifts
        .iter()
        .filter(|s| s.status == ShiftStatus::Active)
        .count();
    let scheduled: i64 = shifts.iter().map(Shift::duration_millis).sum();
    let worked: i64 = attendance.iter().map(|a| a.worked_millis(now)).sum();

    let attended: HashSet<&str> = attendance.iter().map(|a| a.shift_id.as_str()).collect();
    let attended_shifts = shifts
        .iter()
        .filter(|s| s.id.as_deref().is_some_and(|id| attended.contains(id)))
        .count();
    let attendance_rate = if shifts.is_empty() {
        0.0
    } else {
        attended_shifts as f64 / shifts.len() as f64
    };

    let mut breaks_by_type = BTreeMap::new();
    let mut break_millis = 0;
    for b in breaks.iter().filter(|b| b.status != BreakStatus::Cancelled) {
        *breaks_by_type.entry(b.break_type).or_insert(0) += 1;
        break_millis += b.elapsed_millis_at(now);
    }

    ShiftAnalytics {
        window,
        total_shifts: shifts.len(),
        active_shifts,
        completed_shifts: shifts.len() - active_shifts,
        scheduled_hours: hours(scheduled),
        worked_hours: hours(worked),
        attendance_rate,
        total_break_minutes: break_millis / 60_000,
        breaks_by_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{AttendanceStatus, BreakType};

    const H: i64 = 3_600_000;

    fn shift(id: &str, start: i64, hours: i64, status: ShiftStatus) -> Shift {
        Shift {
            id: Some(id.into()),
            employee_id: "c1".into(),
            start_time: start,
            end_time: start + hours * H,
            status,
            cashier_name: String::new(),
            cashier_email: String::new(),
            notes: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_empty_window() {
        let a = compute_analytics(ShiftWindow::new(0, 7 * 24 * H), &[], &[], &[], 0);
        assert_eq!(a.total_shifts, 0);
        assert_eq!(a.attendance_rate, 0.0);
        assert!(a.breaks_by_type.is_empty());
    }

    #[test]
    fn test_totals() {
        let shifts = vec![
            shift("s1", 0, 8, ShiftStatus::Completed),
            shift("s2", 24 * H, 4, ShiftStatus::Active),
        ];
        let attendance = vec![AttendanceRecord {
            id: Some("a1".into()),
            shift_id: "s1".into(),
            cashier_id: "c1".into(),
            clock_in_time: 0,
            clock_out_time: Some(7 * H + H / 2),
            status: AttendanceStatus::Completed,
            cashier_name: String::new(),
            cashier_email: String::new(),
        }];
        let mut lunch = BreakRecord::start("c1", BreakType::Lunch, 2 * H);
        lunch.status = BreakStatus::Completed;
        lunch.elapsed_millis = 30 * 60_000;
        lunch.resumed_at = None;
        let mut cancelled = BreakRecord::start("c1", BreakType::Short, 3 * H);
        cancelled.status = BreakStatus::Cancelled;

        let a = compute_analytics(
            ShiftWindow::new(0, 7 * 24 * H),
            &shifts,
            &attendance,
            &[lunch, cancelled],
            48 * H,
        );
        assert_eq!(a.total_shifts, 2);
        assert_eq!(a.active_shifts, 1);
        assert_eq!(a.completed_shifts, 1);
        assert_eq!(a.scheduled_hours, 12.0);
        assert_eq!(a.worked_hours, 7.5);
        assert_eq!(a.attendance_rate, 0.5);
        assert_eq!(a.total_break_minutes, 30);
        assert_eq!(a.breaks_by_type.get(&BreakType::Lunch), Some(&1));
        assert_eq!(a.breaks_by_type.get(&BreakType::Short), None);
    }
}
