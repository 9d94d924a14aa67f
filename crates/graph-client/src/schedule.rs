//! Scheduled-publish window
//!
//! The Graph API only accepts `scheduled_publish_time` between 10 minutes
//! and 6 months from now. Both bounds are exclusive; a delay at either
//! threshold, zero, or negative sends no scheduling fields at all (the
//! post goes out immediately).

use std::time::{SystemTime, UNIX_EPOCH};

/// Minimum schedulable delay, exclusive (10 minutes, in milliseconds).
pub(crate) const SCHEDULE_MIN_DELAY_MS: i64 = 10 * 60 * 1000;

/// Maximum schedulable delay, exclusive (6 months, in milliseconds).
pub(crate) const SCHEDULE_MAX_DELAY_MS: i64 = 6 * 30 * 24 * 60 * 60 * 1000;

/// Compute the `scheduled_publish_time` for a delay from now, or `None`
/// when the delay falls outside the schedulable window.
pub(crate) fn scheduled_publish_time(delay_ms: Option<i64>) -> Option<u64> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    schedule_at(delay_ms?, now)
}

/// Pure form of the window check: unix seconds of `now + delay`, or
/// `None` when the delay is not strictly inside the window.
pub(crate) fn schedule_at(delay_ms: i64, now_unix_secs: u64) -> Option<u64> {
    if delay_ms > SCHEDULE_MIN_DELAY_MS && delay_ms < SCHEDULE_MAX_DELAY_MS {
        Some(now_unix_secs + (delay_ms / 1000) as u64)
    } else {
        None
    }
}
