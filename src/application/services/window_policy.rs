use chrono::{DateTime, Timelike, Utc};

use crate::application::config::ProcessingMode;

/// Whether a dispatch cycle is currently permitted.
///
/// Pure function of its inputs; safe to call repeatedly and concurrently.
pub fn is_dispatch_allowed(
    now: DateTime<Utc>,
    mode: ProcessingMode,
    hour_from: u32,
    hour_to: u32,
) -> bool {
    match mode {
        ProcessingMode::Immediate => true,
        ProcessingMode::Scheduled => hour_in_window(now.hour(), hour_from, hour_to),
    }
}

/// Time-of-day window check over `[from, to)`.
///
/// `from > to` wraps past midnight (22→6 allows hour >= 22 or hour < 6).
/// `from == to` degenerates to the whole day being allowed.
pub fn hour_in_window(hour: u32, from: u32, to: u32) -> bool {
    if from == to {
        return true;
    }
    if from < to {
        from <= hour && hour < to
    } else {
        hour >= from || hour < to
    }
}
