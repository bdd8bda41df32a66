use std::time::Duration;

/// Pomodoro tick interval in seconds; one tick consumes one second
pub const TICK_SECS: u64 = 1;

/// Get tick duration
pub fn tick_duration() -> Duration {
    Duration::from_secs(TICK_SECS)
}
