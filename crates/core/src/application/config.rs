// Monitor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::{
    DEFAULT_EMIT_DEBOUNCE, DEFAULT_FAST_INTERVAL, DEFAULT_LOG_THROTTLE, DEFAULT_SLOW_INTERVAL,
};
use crate::error::{AppError, Result};

/// Timing knobs of the adaptive monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Cadence while idle
    pub slow_interval: Duration,
    /// Cadence while services are changing
    pub fast_interval: Duration,
    /// Per-service gate for status-change events
    pub debounce_window: Duration,
    /// Per-service gate for log events
    pub throttle_window: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            slow_interval: DEFAULT_SLOW_INTERVAL,
            fast_interval: DEFAULT_FAST_INTERVAL,
            debounce_window: DEFAULT_EMIT_DEBOUNCE,
            throttle_window: DEFAULT_LOG_THROTTLE,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fast_interval.is_zero() || self.slow_interval.is_zero() {
            return Err(AppError::Config(
                "poll intervals must be greater than zero".to_string(),
            ));
        }
        if self.fast_interval >= self.slow_interval {
            return Err(AppError::Config(format!(
                "fast interval ({:?}) must be shorter than slow interval ({:?})",
                self.fast_interval, self.slow_interval
            )));
        }
        if self.debounce_window.is_zero() || self.throttle_window.is_zero() {
            return Err(AppError::Config(
                "debounce and throttle windows must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
