// Status snapshotter - one service, never fails

use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{ServiceId, ServiceStatus};
use crate::port::StatusProbe;

/// Turns a probe answer into a [`ServiceStatus`]
///
/// Probe failures are reported as a stopped service carrying the error
/// text, so a single broken probe cannot abort a polling round.
#[derive(Clone)]
pub struct StatusSnapshotter {
    probe: Arc<dyn StatusProbe>,
}

impl StatusSnapshotter {
    pub fn new(probe: Arc<dyn StatusProbe>) -> Self {
        Self { probe }
    }

    pub async fn snapshot(&self, id: &ServiceId) -> ServiceStatus {
        match self.probe.check_status(id.as_str()).await {
            Ok(reading) => {
                debug!(
                    service = %id,
                    is_running = reading.is_running,
                    "Service status probed"
                );
                ServiceStatus {
                    name: id.clone(),
                    is_running: reading.is_running,
                    message: reading.message,
                }
            }
            Err(e) => {
                warn!(service = %id, error = %e, "Status probe failed, treating service as stopped");
                ServiceStatus::stopped(id.clone(), format!("{} status unavailable: {}", id, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::status_probe::mocks::MockStatusProbe;
    use crate::port::ProbeError;

    #[tokio::test]
    async fn test_snapshot_wraps_reading() {
        let probe = Arc::new(MockStatusProbe::new().with_service("web", true));
        let snapshotter = StatusSnapshotter::new(probe);
        let id = ServiceId::new("web").unwrap();

        let status = snapshotter.snapshot(&id).await;

        assert_eq!(status.name, id);
        assert!(status.is_running);
        assert_eq!(status.message, "web is running");
    }

    #[tokio::test]
    async fn test_snapshot_normalizes_probe_failure() {
        let probe = MockStatusProbe::new().with_service("db", true);
        probe.fail_checks("db", ProbeError::SpawnFailed("permission denied".into()));
        let snapshotter = StatusSnapshotter::new(Arc::new(probe));

        let status = snapshotter.snapshot(&ServiceId::new("db").unwrap()).await;

        assert!(!status.is_running);
        assert!(status.message.contains("permission denied"));
    }

    #[tokio::test]
    async fn test_snapshot_unknown_service_is_stopped() {
        let snapshotter = StatusSnapshotter::new(Arc::new(MockStatusProbe::new()));
        let status = snapshotter
            .snapshot(&ServiceId::new("ghost").unwrap())
            .await;
        assert!(!status.is_running);
        assert!(status.message.contains("could not be found"));
    }
}
