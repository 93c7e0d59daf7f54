use std::time::Duration;

pub const BACKOFF_BASE: u64 = 2;

/// Delay before retrying after the `failures`-th consecutive failure:
/// `BACKOFF_BASE^failures` seconds, never longer than `max_delay`.
pub fn backoff_delay(failures: u32, max_delay: Duration) -> Duration {
    let seconds = BACKOFF_BASE.checked_pow(failures).unwrap_or(u64::MAX);
    Duration::from_secs(seconds).min(max_delay)
}
