use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Per-model fixed-window request counters, keyed by model id
pub type UsageStats = HashMap<String, UsageWindow>;

/// Rolling fixed-window counters for one model. Windows are measured from
/// the last reset instant, not aligned to wall-clock boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageWindow {
    pub minute_count: u32,
    pub last_minute_reset: i64,
    pub day_count: u32,
    pub last_day_reset: i64,
}

impl UsageWindow {
    pub fn starting_at(now_ms: i64) -> Self {
        Self {
            minute_count: 0,
            last_minute_reset: now_ms,
            day_count: 0,
            last_day_reset: now_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitStatus {
    Success,
    #[serde(rename = "Rate Limited")]
    RateLimited,
    Error,
}

/// One request (or system check) observed this session. Append-only;
/// cleared by the daily rollover sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorLog {
    pub id: String,
    pub ip: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub model_used: String,
    pub status: VisitStatus,
}
