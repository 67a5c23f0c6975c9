// Concurrent poller - fan-out / fan-in over every watched service

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{debug, error};

use super::snapshot::StatusSnapshotter;
use crate::domain::{ServiceId, ServiceStatus};
use crate::port::StatusProbe;

/// Polls all services of a round concurrently
///
/// Each service is checked in its own task so that a slow probe only delays
/// its own result. The round returns once every task has finished, one
/// status per requested id, in completion order.
#[derive(Clone)]
pub struct ConcurrentPoller {
    snapshotter: StatusSnapshotter,
}

impl ConcurrentPoller {
    pub fn new(probe: Arc<dyn StatusProbe>) -> Self {
        Self {
            snapshotter: StatusSnapshotter::new(probe),
        }
    }

    pub fn snapshotter(&self) -> &StatusSnapshotter {
        &self.snapshotter
    }

    /// Run one polling round
    ///
    /// Dropping the returned future detaches the spawned checks; they still
    /// run to completion but their results go nowhere.
    pub async fn poll_all(&self, ids: &[ServiceId]) -> Vec<ServiceStatus> {
        let mut tasks = FuturesUnordered::new();

        for id in ids {
            let snapshotter = self.snapshotter.clone();
            let task_id = id.clone();
            let handle = tokio::spawn(async move { snapshotter.snapshot(&task_id).await });
            let id = id.clone();
            tasks.push(async move { (id, handle.await) });
        }

        let mut results = Vec::with_capacity(ids.len());
        while let Some((id, joined)) = tasks.next().await {
            match joined {
                Ok(status) => results.push(status),
                Err(join_err) => {
                    // Panicked probe task: same policy as any probe failure
                    error!(service = %id, error = ?join_err, "Status check task failed");
                    let reason = if join_err.is_panic() {
                        "probe panicked"
                    } else {
                        "probe cancelled"
                    };
                    results.push(ServiceStatus::stopped(
                        id.clone(),
                        format!("{} status unavailable: {}", id, reason),
                    ));
                }
            }
        }

        debug!(services = results.len(), "Polling round collected");
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::watch_list;
    use crate::port::status_probe::mocks::MockStatusProbe;
    use crate::port::ProbeError;
    use std::collections::HashMap;
    use std::time::Duration;

    fn by_name(round: Vec<ServiceStatus>) -> HashMap<String, ServiceStatus> {
        round
            .into_iter()
            .map(|s| (s.name.to_string(), s))
            .collect()
    }

    #[tokio::test]
    async fn test_poll_all_returns_one_status_per_service() {
        let probe = MockStatusProbe::new()
            .with_service("web", true)
            .with_service("db", false)
            .with_service("cache", true);
        let poller = ConcurrentPoller::new(Arc::new(probe));
        let ids = watch_list(["web", "db", "cache"]).unwrap();

        let round = by_name(poller.poll_all(&ids).await);

        assert_eq!(round.len(), 3);
        assert!(round["web"].is_running);
        assert!(!round["db"].is_running);
        assert!(round["cache"].is_running);
    }

    #[tokio::test]
    async fn test_failing_probe_does_not_discard_others() {
        let probe = MockStatusProbe::new()
            .with_service("web", true)
            .with_service("db", true);
        probe.fail_checks("db", ProbeError::SpawnFailed("systemctl: not found".into()));
        let poller = ConcurrentPoller::new(Arc::new(probe));
        let ids = watch_list(["web", "db"]).unwrap();

        let round = by_name(poller.poll_all(&ids).await);

        assert_eq!(round.len(), 2);
        assert!(round["web"].is_running);
        assert!(!round["db"].is_running);
        assert!(round["db"].message.contains("not found"));
    }

    #[tokio::test]
    async fn test_panicking_probe_is_normalized() {
        let probe = MockStatusProbe::new()
            .with_service("web", true)
            .with_service("db", true);
        probe.panic_on_check("db");
        let poller = ConcurrentPoller::new(Arc::new(probe));
        let ids = watch_list(["web", "db"]).unwrap();

        let round = by_name(poller.poll_all(&ids).await);

        assert!(round["web"].is_running);
        assert!(!round["db"].is_running);
        assert!(round["db"].message.contains("panicked"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_latency_bounded_by_slowest_probe() {
        let probe = MockStatusProbe::new()
            .with_service("a", true)
            .with_service("b", true)
            .with_service("c", true);
        for id in ["a", "b", "c"] {
            probe.set_delay(id, Duration::from_secs(1));
        }
        let poller = ConcurrentPoller::new(Arc::new(probe));
        let ids = watch_list(["a", "b", "c"]).unwrap();

        let started = tokio::time::Instant::now();
        let round = poller.poll_all(&ids).await;

        assert_eq!(round.len(), 3);
        // Serial polling would take 3s
        assert!(started.elapsed() < Duration::from_millis(1500));
    }
}
