//! 时间工具函数 (业务时区转换)
//!
//! 日期→时间戳转换统一在这里完成，服务层只接收 `i64` Unix millis。

use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use shared::models::ShiftWindow;

use super::{AppError, AppResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 解析 IANA 时区名，失败时回退到 UTC
pub fn parse_timezone(name: &str) -> Tz {
    name.parse().unwrap_or_else(|e| {
        tracing::warn!("Unknown timezone '{}': {}, falling back to UTC", name, e);
        Tz::UTC
    })
}

/// 日期零点 → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date.and_time(NaiveTime::MIN);
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期结束 → 次日 00:00:00 的 Unix millis (业务时区)
///
/// 返回次日零点时间戳，调用方使用 `< end` (不含) 语义。
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    day_start_millis(next_day, tz)
}

/// 业务时区中 `millis` 所在的日期
pub fn local_date(millis: i64, tz: Tz) -> NaiveDate {
    tz.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.date_naive())
        .unwrap_or_else(|| {
            chrono::DateTime::from_timestamp_millis(millis)
                .map(|dt| dt.date_naive())
                .unwrap_or_default()
        })
}

/// 包含 `now` 的自然周 (周日开始)：`[周日 00:00, 下周日 00:00)`
pub fn week_window(now: i64, tz: Tz) -> ShiftWindow {
    let today = local_date(now, tz);
    let days_from_sunday = i64::from(today.weekday().num_days_from_sunday());
    let sunday = today - chrono::Duration::days(days_from_sunday);
    let next_sunday = sunday + chrono::Duration::days(7);
    ShiftWindow::new(day_start_millis(sunday, tz), day_start_millis(next_sunday, tz))
}

/// 日期区间 [start, end] (含 end 当天) → 时间窗口
pub fn date_range_window(start: NaiveDate, end: NaiveDate, tz: Tz) -> AppResult<ShiftWindow> {
    if end < start {
        return Err(AppError::validation("End date must not be before start date"));
    }
    Ok(ShiftWindow::new(day_start_millis(start, tz), day_end_millis(end, tz)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn millis(s: &str) -> i64 {
        chrono::DateTime::parse_from_rfc3339(s)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_week_starts_on_sunday_utc() {
        // Wednesday 2024-06-12
        let window = week_window(millis("2024-06-12T15:30:00Z"), Tz::UTC);
        assert_eq!(window.start, millis("2024-06-09T00:00:00Z"));
        assert_eq!(window.end, millis("2024-06-16T00:00:00Z"));
        assert_eq!(
            local_date(window.start, Tz::UTC).weekday(),
            Weekday::Sun
        );
    }

    #[test]
    fn test_sunday_belongs_to_its_own_week() {
        let window = week_window(millis("2024-06-09T00:00:00Z"), Tz::UTC);
        assert_eq!(window.start, millis("2024-06-09T00:00:00Z"));
    }

    #[test]
    fn test_week_uses_business_timezone() {
        // 2024-06-09 02:00 UTC is still Saturday 2024-06-08 in New York
        let tz: Tz = "America/New_York".parse().unwrap();
        let window = week_window(millis("2024-06-09T02:00:00Z"), tz);
        assert_eq!(window.start, millis("2024-06-02T00:00:00-04:00"));
        assert_eq!(window.end, millis("2024-06-09T00:00:00-04:00"));
    }

    #[test]
    fn test_date_range_window() {
        let start = parse_date("2024-06-10").unwrap();
        let end = parse_date("2024-06-11").unwrap();
        let window = date_range_window(start, end, Tz::UTC).unwrap();
        assert_eq!(window.end - window.start, 2 * 24 * 3_600_000);
        assert!(date_range_window(end, start, Tz::UTC).is_err());
        assert!(parse_date("06/10/2024").is_err());
    }

    #[test]
    fn test_parse_timezone_fallback() {
        assert_eq!(parse_timezone("Not/AZone"), Tz::UTC);
        assert_eq!(parse_timezone("Europe/Madrid").name(), "Europe/Madrid");
    }
}
