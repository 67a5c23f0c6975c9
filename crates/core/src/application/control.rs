// Service control - start/stop requests on behalf of the UI layer

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::constants::TOGGLE_SETTLE_DELAY;
use super::poller::ConcurrentPoller;
use crate::domain::{LogEntry, LogLevel, ServiceId, ServiceStatus};
use crate::port::{
    emit_serialized, EventSink, StatusProbe, TimeProvider, EVENT_LOG, EVENT_STATUS_CHANGED,
};

/// Start/stop front end over the platform probe
///
/// Failures come back as an `error` level [`LogEntry`]; nothing is retried.
pub struct ServiceControl {
    probe: Arc<dyn StatusProbe>,
    poller: ConcurrentPoller,
    sink: Arc<dyn EventSink>,
    time_provider: Arc<dyn TimeProvider>,
    settle_delay: Duration,
}

impl ServiceControl {
    pub fn new(
        probe: Arc<dyn StatusProbe>,
        sink: Arc<dyn EventSink>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            poller: ConcurrentPoller::new(probe.clone()),
            probe,
            sink,
            time_provider,
            settle_delay: TOGGLE_SETTLE_DELAY,
        }
    }

    /// Override how long `toggle` waits before re-checking the service
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub async fn status(&self, id: &ServiceId) -> ServiceStatus {
        self.poller.snapshotter().snapshot(id).await
    }

    /// Current status of every service, in the order given
    pub async fn all_statuses(&self, ids: &[ServiceId]) -> Vec<ServiceStatus> {
        let mut statuses = self.poller.poll_all(ids).await;
        statuses.sort_by_key(|s| ids.iter().position(|id| *id == s.name));
        statuses
    }

    pub async fn start(&self, id: &ServiceId) -> LogEntry {
        let result = self.probe.start(id.as_str()).await;
        let now = self.time_provider.now_millis();
        match result {
            Ok(()) => {
                info!(service = %id, "Service started");
                LogEntry::at(now, LogLevel::Success, format!("{} started successfully", id))
            }
            Err(e) => {
                error!(service = %id, error = %e, "Service start failed");
                LogEntry::at(now, LogLevel::Error, format!("Failed to start {}: {}", id, e))
            }
        }
    }

    pub async fn stop(&self, id: &ServiceId) -> LogEntry {
        let result = self.probe.stop(id.as_str()).await;
        let now = self.time_provider.now_millis();
        match result {
            Ok(()) => {
                info!(service = %id, "Service stopped");
                LogEntry::at(now, LogLevel::Success, format!("{} stopped successfully", id))
            }
            Err(e) => {
                error!(service = %id, error = %e, "Service stop failed");
                LogEntry::at(now, LogLevel::Error, format!("Failed to stop {}: {}", id, e))
            }
        }
    }

    /// Start or stop `id`, publish the outcome, then re-check the service
    ///
    /// The re-check runs in the background after the settle delay and emits
    /// a status-change event directly, outside the monitor's debounce.
    pub async fn toggle(&self, id: &ServiceId, should_start: bool) -> LogEntry {
        let entry = if should_start {
            self.start(id).await
        } else {
            self.stop(id).await
        };
        emit_serialized(self.sink.as_ref(), EVENT_LOG, &entry);

        let snapshotter = self.poller.snapshotter().clone();
        let sink = self.sink.clone();
        let settle_delay = self.settle_delay;
        let id = id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(settle_delay).await;
            let status = snapshotter.snapshot(&id).await;
            emit_serialized(sink.as_ref(), EVENT_STATUS_CHANGED, &status);
        });

        entry
    }
}
