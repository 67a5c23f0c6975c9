// Monitor constants (No magic values)
use std::time::Duration;

/// Resting poll cadence when nothing is changing (5s)
pub const DEFAULT_SLOW_INTERVAL: Duration = Duration::from_secs(5);

/// Poll cadence right after a change was observed (300ms)
pub const DEFAULT_FAST_INTERVAL: Duration = Duration::from_millis(300);

/// Minimum gap between two status-change events for one service (400ms)
pub const DEFAULT_EMIT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Minimum gap between two log events for one service (2s)
pub const DEFAULT_LOG_THROTTLE: Duration = Duration::from_secs(2);

/// Wait after a start/stop request before re-checking the service (500ms)
pub const TOGGLE_SETTLE_DELAY: Duration = Duration::from_millis(500);
