// Change reporter - change detection, debounced status events, throttled logs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::config::MonitorConfig;
use crate::domain::{LogEntry, LogLevel, ServiceId, ServiceStatus};
use crate::port::{emit_serialized, EventSink, TimeProvider, EVENT_LOG, EVENT_STATUS_CHANGED};

/// True when more than `window` has passed since `last`
///
/// A gate that never fired is always open. Shared by the status-change
/// debounce and the log throttle.
pub fn window_elapsed(now_millis: i64, last_millis: Option<i64>, window: Duration) -> bool {
    match last_millis {
        None => true,
        Some(last) => {
            let window_millis = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
            now_millis.saturating_sub(last) > window_millis
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ServiceTrack {
    /// None until the baseline poll has seen the service
    last_status: Option<bool>,
    last_emit: Option<i64>,
    last_log: Option<i64>,
}

/// Per-service memory of the monitor
///
/// Keyed by the fixed watch list given at construction; entries are only
/// ever updated, never added or removed afterwards.
#[derive(Debug, Clone)]
pub struct MonitorState {
    services: HashMap<ServiceId, ServiceTrack>,
}

impl MonitorState {
    pub fn new(services: &[ServiceId]) -> Self {
        Self {
            services: services
                .iter()
                .map(|id| (id.clone(), ServiceTrack::default()))
                .collect(),
        }
    }

    pub fn last_status(&self, id: &ServiceId) -> Option<bool> {
        self.services.get(id).and_then(|t| t.last_status)
    }

    pub fn last_emit_millis(&self, id: &ServiceId) -> Option<i64> {
        self.services.get(id).and_then(|t| t.last_emit)
    }

    pub fn last_log_millis(&self, id: &ServiceId) -> Option<i64> {
        self.services.get(id).and_then(|t| t.last_log)
    }

    /// Whether every watched service has a known status
    pub fn is_seeded(&self) -> bool {
        self.services.values().all(|t| t.last_status.is_some())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Compares each round with the last known state and notifies the sink
pub struct ChangeReporter {
    sink: Arc<dyn EventSink>,
    time_provider: Arc<dyn TimeProvider>,
    debounce_window: Duration,
    throttle_window: Duration,
    state: MonitorState,
}

impl ChangeReporter {
    pub fn new(
        services: &[ServiceId],
        sink: Arc<dyn EventSink>,
        time_provider: Arc<dyn TimeProvider>,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            sink,
            time_provider,
            debounce_window: config.debounce_window,
            throttle_window: config.throttle_window,
            state: MonitorState::new(services),
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Record a baseline round without reporting anything
    pub fn seed(&mut self, round: &[ServiceStatus]) {
        for status in round {
            match self.state.services.get_mut(&status.name) {
                Some(track) => track.last_status = Some(status.is_running),
                None => warn!(service = %status.name, "Ignoring status of unwatched service"),
            }
        }
        info!(services = round.len(), "Baseline status recorded");
    }

    /// Apply one round and return how many services changed
    ///
    /// The count includes changes whose events were debounced or throttled
    /// away. `last_status` always reflects the round, emitted or not.
    pub fn report(&mut self, round: &[ServiceStatus]) -> usize {
        let now = self.time_provider.now_millis();
        let mut changed = 0;

        for status in round {
            let Some(track) = self.state.services.get_mut(&status.name) else {
                warn!(service = %status.name, "Ignoring status of unwatched service");
                continue;
            };

            match track.last_status {
                Some(previous) if previous == status.is_running => continue,
                None => {
                    // First sighting is a baseline, not a change
                    track.last_status = Some(status.is_running);
                    continue;
                }
                Some(_) => {}
            }

            changed += 1;
            track.last_status = Some(status.is_running);

            if window_elapsed(now, track.last_emit, self.debounce_window) {
                emit_serialized(self.sink.as_ref(), EVENT_STATUS_CHANGED, status);
                track.last_emit = Some(now);
            } else {
                debug!(service = %status.name, "Status-change event debounced");
            }

            if window_elapsed(now, track.last_log, self.throttle_window) {
                let level = if status.is_running {
                    LogLevel::Success
                } else {
                    LogLevel::Warning
                };
                let entry = LogEntry::at(
                    now,
                    level,
                    format!("{} status changed: {}", status.name, status.message),
                );
                emit_serialized(self.sink.as_ref(), EVENT_LOG, &entry);
                track.last_log = Some(now);
            } else {
                debug!(service = %status.name, "Log event throttled");
            }

            info!(
                service = %status.name,
                is_running = status.is_running,
                "Service status changed"
            );
        }

        changed
    }
}
