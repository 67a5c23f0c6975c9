// Log Entry Domain Model
//
// Payload of the `service:log` event and the result of start/stop requests.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Log severity as understood by the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Success => write!(f, "success"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Local wall-clock time, `HH:MM:SS`
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    /// Create an entry stamped at `now_millis` (milliseconds since epoch)
    pub fn at(now_millis: i64, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: clock_time(now_millis),
            level,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }
}

/// Render epoch milliseconds as local `HH:MM:SS`
pub fn clock_time(now_millis: i64) -> String {
    match Local.timestamp_millis_opt(now_millis).single() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(LogLevel::Warning).unwrap(),
            serde_json::json!("warning")
        );
        assert_eq!(LogLevel::Success.to_string(), "success");
    }

    #[test]
    fn test_clock_time_format() {
        let ts = clock_time(1_700_000_000_000);
        assert_eq!(ts.len(), 8);
        assert_eq!(ts.as_bytes()[2], b':');
        assert_eq!(ts.as_bytes()[5], b':');
    }

    #[test]
    fn test_entry_matches_local_clock() {
        let now = chrono::Utc::now().timestamp_millis();
        let entry = LogEntry::at(now, LogLevel::Info, "hello");
        assert_eq!(entry.timestamp, clock_time(now));
        assert!(!entry.is_error());
    }
}
