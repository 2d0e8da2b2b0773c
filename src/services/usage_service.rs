//! Advisory request accounting: rolling fixed-window counters per model,
//! plus the once-a-day sweep that clears all stats at the local date change.

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::models::{ModelConfig, UsageStats, UsageWindow, VisitorLog};

pub const MINUTE_WINDOW_MS: i64 = 60_000;
pub const DAY_WINDOW_MS: i64 = 86_400_000;

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Count one outbound request against `key` at `now_ms`. Windows that have
/// expired are reset before the increment; both counters then advance.
pub fn record_request(stats: &mut UsageStats, key: &str, now_ms: i64) -> UsageWindow {
    let window = stats
        .entry(key.to_string())
        .or_insert_with(|| UsageWindow::starting_at(now_ms));

    if now_ms - window.last_minute_reset > MINUTE_WINDOW_MS {
        window.minute_count = 0;
        window.last_minute_reset = now_ms;
    }

    if now_ms - window.last_day_reset > DAY_WINDOW_MS {
        window.day_count = 0;
        window.last_day_reset = now_ms;
    }

    window.minute_count += 1;
    window.day_count += 1;

    *window
}

/// Advisory rate-limit standing of one model. Nothing here blocks a request.
#[derive(Debug, Clone, Copy)]
pub struct RateStatus {
    pub minute_used: u32,
    pub minute_limit: u32,
    pub day_used: u32,
    pub day_limit: u32,
    pub limited: bool,
}

/// Read-only view of a model's window against its catalog limits. Expired
/// windows read as zero without mutating the stored state.
pub fn rate_status(stats: &UsageStats, model: &ModelConfig, now_ms: i64) -> RateStatus {
    let window = stats.get(model.id);

    let minute_used = window
        .filter(|w| now_ms - w.last_minute_reset <= MINUTE_WINDOW_MS)
        .map(|w| w.minute_count)
        .unwrap_or(0);
    let day_used = window
        .filter(|w| now_ms - w.last_day_reset <= DAY_WINDOW_MS)
        .map(|w| w.day_count)
        .unwrap_or(0);

    RateStatus {
        minute_used,
        minute_limit: model.rpm,
        day_used,
        day_limit: model.rpd,
        limited: minute_used >= model.rpm || day_used >= model.rpd,
    }
}

/// Daily rollover sweep, polled once per minute. Clears all usage stats and
/// visitor logs when the local calendar date has changed since the last
/// observation, so the reset fires exactly once per day even if the poll
/// never lands on the midnight minute. Returns whether a sweep ran.
pub fn run_daily_rollover(
    stats: &mut UsageStats,
    logs: &mut Vec<VisitorLog>,
    last_seen_day: &mut NaiveDate,
    now: DateTime<Local>,
) -> bool {
    let today = now.date_naive();
    if today == *last_seen_day {
        return false;
    }

    stats.clear();
    logs.clear();
    *last_seen_day = today;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_increments_within_minute_window() {
        let mut stats = UsageStats::new();
        let t1 = 1_000_000;
        record_request(&mut stats, "gemini-2.0-flash", t1);
        let window = record_request(&mut stats, "gemini-2.0-flash", t1 + 59_000);

        assert_eq!(window.minute_count, 2);
        assert_eq!(window.day_count, 2);
    }

    #[test]
    fn test_minute_window_resets_after_expiry() {
        let mut stats = UsageStats::new();
        let t1 = 1_000_000;
        record_request(&mut stats, "gemini-2.0-flash", t1);
        let window = record_request(&mut stats, "gemini-2.0-flash", t1 + 61_000);

        assert_eq!(window.minute_count, 1);
        assert_eq!(window.last_minute_reset, t1 + 61_000);
        // the day window is untouched
        assert_eq!(window.day_count, 2);
        assert_eq!(window.last_day_reset, t1);
    }

    #[test]
    fn test_day_window_resets_after_expiry() {
        let mut stats = UsageStats::new();
        let t1 = 1_000_000;
        record_request(&mut stats, "gemini-2.0-flash", t1);
        let window = record_request(&mut stats, "gemini-2.0-flash", t1 + DAY_WINDOW_MS + 1);

        assert_eq!(window.day_count, 1);
        assert_eq!(window.minute_count, 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut stats = UsageStats::new();
        record_request(&mut stats, "gemini-2.0-flash", 0);
        record_request(&mut stats, "gemini-1.5-pro", 0);

        assert_eq!(stats.get("gemini-2.0-flash").unwrap().minute_count, 1);
        assert_eq!(stats.get("gemini-1.5-pro").unwrap().minute_count, 1);
    }

    #[test]
    fn test_rate_status_flags_exhausted_minute_budget() {
        let model = crate::models::catalog::find("gemini-1.5-pro").unwrap();
        let mut stats = UsageStats::new();
        let now = 1_000_000;
        record_request(&mut stats, model.id, now);
        record_request(&mut stats, model.id, now);

        let status = rate_status(&stats, model, now);
        assert_eq!(status.minute_used, 2);
        assert!(status.limited);
    }

    #[test]
    fn test_rate_status_reads_expired_window_as_zero() {
        let model = crate::models::catalog::find("gemini-2.0-flash").unwrap();
        let mut stats = UsageStats::new();
        record_request(&mut stats, model.id, 0);

        let status = rate_status(&stats, model, MINUTE_WINDOW_MS + 1);
        assert_eq!(status.minute_used, 0);
        // stored state is not mutated by the read
        assert_eq!(stats.get(model.id).unwrap().minute_count, 1);
    }

    #[test]
    fn test_rollover_fires_once_per_date_change() {
        let mut stats = UsageStats::new();
        record_request(&mut stats, "gemini-2.0-flash", 0);
        let mut logs = Vec::new();
        let mut last_day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let same_day = Local.with_ymd_and_hms(2025, 3, 1, 23, 59, 0).unwrap();
        assert!(!run_daily_rollover(&mut stats, &mut logs, &mut last_day, same_day));
        assert!(!stats.is_empty());

        let next_day = Local.with_ymd_and_hms(2025, 3, 2, 0, 1, 0).unwrap();
        assert!(run_daily_rollover(&mut stats, &mut logs, &mut last_day, next_day));
        assert!(stats.is_empty());

        // a second check on the same day is a no-op
        let later = Local.with_ymd_and_hms(2025, 3, 2, 0, 2, 0).unwrap();
        assert!(!run_daily_rollover(&mut stats, &mut logs, &mut last_day, later));
    }
}
