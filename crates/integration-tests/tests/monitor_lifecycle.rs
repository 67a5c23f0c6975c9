//! Monitor lifecycle integration tests
//!
//! Drives the adaptive scheduler end to end against scripted probes:
//! baseline, change reporting, cadence switching and cancellation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use valet_core::application::{
    shutdown_channel, AdaptiveScheduler, Cadence, MonitorConfig, MonitorPhase,
};
use valet_core::domain::{watch_list, ServiceId};
use valet_core::port::event_sink::mocks::RecordingEventSink;
use valet_core::port::status_probe::mocks::MockStatusProbe;
use valet_core::port::time_provider::mocks::ManualTimeProvider;
use valet_core::port::{
    ProbeError, ProbeReading, StatusProbe, SystemTimeProvider, TimeProvider, EVENT_LOG,
    EVENT_STATUS_CHANGED,
};

const T0: i64 = 1_700_000_000_000;

fn config() -> MonitorConfig {
    MonitorConfig {
        slow_interval: Duration::from_secs(5),
        fast_interval: Duration::from_millis(300),
        debounce_window: Duration::from_millis(400),
        throttle_window: Duration::from_secs(2),
    }
}

fn id(name: &str) -> ServiceId {
    ServiceId::new(name).unwrap()
}

/// Web goes up, then flaps inside the debounce window
#[tokio::test]
async fn test_web_db_flap_scenario() {
    let probe = Arc::new(
        MockStatusProbe::new()
            .with_service("web", false)
            .with_service("db", false),
    );
    let sink = Arc::new(RecordingEventSink::new());
    let clock = Arc::new(ManualTimeProvider::new(T0));
    let mut monitor = AdaptiveScheduler::new(
        watch_list(["web", "db"]).unwrap(),
        probe.clone(),
        sink.clone(),
        clock.clone(),
        config(),
    )
    .unwrap();

    // Round 1: baseline
    monitor.baseline().await;
    assert!(sink.events().is_empty());
    assert_eq!(monitor.phase(), MonitorPhase::Running(Cadence::IdleSlow));

    // Round 2: web comes up
    clock.advance_millis(5_000);
    probe.set_running("web", true);
    let outcome = monitor.tick().await;
    assert_eq!(outcome.changed, 1);
    assert_eq!(outcome.cadence, Cadence::ActiveFast);
    assert_eq!(
        sink.payloads(EVENT_STATUS_CHANGED),
        vec![json!({"name": "web", "isRunning": true, "message": "web is running"})]
    );
    let logs = sink.payloads(EVENT_LOG);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["level"], "success");
    assert_eq!(logs[0]["message"], "web status changed: web is running");

    // Round 3: web stops and starts again inside the debounce window
    clock.advance_millis(100);
    probe.set_running("web", false);
    assert_eq!(monitor.tick().await.changed, 1);
    clock.advance_millis(100);
    probe.set_running("web", true);
    let outcome = monitor.tick().await;

    assert_eq!(outcome.changed, 1);
    assert_eq!(outcome.cadence, Cadence::ActiveFast);
    assert_eq!(outcome.next_interval, Duration::from_millis(300));
    assert_eq!(monitor.reporter().state().last_status(&id("web")), Some(true));
    assert_eq!(sink.count(EVENT_STATUS_CHANGED), 1);
    assert_eq!(sink.count(EVENT_LOG), 1);

    // A quiet round drops back to the slow cadence
    clock.advance_millis(300);
    let outcome = monitor.tick().await;
    assert_eq!(outcome.changed, 0);
    assert_eq!(outcome.cadence, Cadence::IdleSlow);
}

/// Flips separated by more than the debounce window are both emitted
#[tokio::test]
async fn test_spaced_flips_emit_twice() {
    let probe = Arc::new(MockStatusProbe::new().with_service("cache", true));
    let sink = Arc::new(RecordingEventSink::new());
    let clock = Arc::new(ManualTimeProvider::new(T0));
    let mut monitor = AdaptiveScheduler::new(
        watch_list(["cache"]).unwrap(),
        probe.clone(),
        sink.clone(),
        clock.clone(),
        config(),
    )
    .unwrap();
    monitor.baseline().await;

    probe.set_running("cache", false);
    monitor.tick().await;
    clock.advance_millis(401);
    probe.set_running("cache", true);
    monitor.tick().await;

    let statuses = sink.payloads(EVENT_STATUS_CHANGED);
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0]["isRunning"], false);
    assert_eq!(statuses[1]["isRunning"], true);

    // 401ms is still inside the log throttle window
    let logs = sink.payloads(EVENT_LOG);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["level"], "warning");
}

/// One broken probe among several never aborts the round
#[tokio::test]
async fn test_failing_probe_among_many() {
    let probe = Arc::new(
        MockStatusProbe::new()
            .with_service("web", true)
            .with_service("db", true)
            .with_service("cache", true),
    );
    let sink = Arc::new(RecordingEventSink::new());
    let mut monitor = AdaptiveScheduler::new(
        watch_list(["web", "db", "cache"]).unwrap(),
        probe.clone(),
        sink.clone(),
        Arc::new(ManualTimeProvider::new(T0)),
        config(),
    )
    .unwrap();
    monitor.baseline().await;

    probe.fail_checks("db", ProbeError::Timeout(10_000));
    let outcome = monitor.tick().await;

    assert_eq!(outcome.changed, 1);
    let statuses = sink.payloads(EVENT_STATUS_CHANGED);
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0]["name"], "db");
    assert_eq!(statuses[0]["isRunning"], false);
    assert!(statuses[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("db status unavailable"));
    assert_eq!(
        monitor.reporter().state().last_status(&id("web")),
        Some(true)
    );
}

/// A service unknown to the service manager reads as stopped
#[tokio::test]
async fn test_unknown_service_reads_stopped() {
    let probe = Arc::new(MockStatusProbe::new().with_service("web", true));
    let mut monitor = AdaptiveScheduler::new(
        watch_list(["web", "ghost"]).unwrap(),
        probe,
        Arc::new(RecordingEventSink::new()),
        Arc::new(ManualTimeProvider::new(T0)),
        config(),
    )
    .unwrap();

    monitor.baseline().await;

    assert_eq!(
        monitor.reporter().state().last_status(&id("ghost")),
        Some(false)
    );
}

/// Probe implemented outside the core crate, answering from a script
struct ScriptedProbe {
    script: Vec<bool>,
    calls: AtomicUsize,
}

#[async_trait]
impl StatusProbe for ScriptedProbe {
    async fn check_status(&self, id: &str) -> Result<ProbeReading, ProbeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.script[call.min(self.script.len() - 1)];
        Ok(ProbeReading::new(running, format!("{} scripted", id)))
    }

    async fn start(&self, id: &str) -> Result<(), ProbeError> {
        Err(ProbeError::Unsupported(format!("start {}", id)))
    }

    async fn stop(&self, id: &str) -> Result<(), ProbeError> {
        Err(ProbeError::Unsupported(format!("stop {}", id)))
    }
}

/// Wall clock that follows tokio's paused time
struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl TimeProvider for TokioClock {
    fn now_millis(&self) -> i64 {
        T0 + self.origin.elapsed().as_millis() as i64
    }
}

/// Running loop: baseline, fast burst while flapping, back to slow
#[tokio::test(start_paused = true)]
async fn test_run_adapts_cadence_and_stops_on_shutdown() {
    // baseline, change, change, quiet, quiet...
    let probe = Arc::new(ScriptedProbe {
        script: vec![false, true, false, false],
        calls: AtomicUsize::new(0),
    });
    let sink = Arc::new(RecordingEventSink::new());
    let mut monitor = AdaptiveScheduler::new(
        watch_list(["web"]).unwrap(),
        probe.clone(),
        sink.clone(),
        Arc::new(TokioClock::new()),
        config(),
    )
    .unwrap();
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let handle = tokio::spawn(async move {
        let exit = monitor.run(shutdown_rx).await;
        (monitor, exit)
    });

    // baseline at 0, ticks at 5s, 5.3s, 5.6s, then 10.6s
    tokio::time::sleep(Duration::from_millis(5_700)).await;
    assert_eq!(probe.calls.load(Ordering::SeqCst), 4);

    tokio::time::sleep(Duration::from_millis(4_000)).await;
    assert_eq!(probe.calls.load(Ordering::SeqCst), 4);

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(probe.calls.load(Ordering::SeqCst), 5);

    shutdown_tx.shutdown();
    let (monitor, exit) = handle.await.unwrap();

    assert_eq!(exit.rounds, 4);
    assert_eq!(monitor.phase(), MonitorPhase::Stopped);
    // the 5.3s flip lands inside both windows
    assert_eq!(sink.count(EVENT_STATUS_CHANGED), 1);
    // startup announcement plus the first change
    assert_eq!(sink.count(EVENT_LOG), 2);
}

/// Dropping the sender stops the monitor during its idle wait
#[tokio::test(start_paused = true)]
async fn test_dropped_sender_stops_monitor() {
    let probe = Arc::new(MockStatusProbe::new().with_service("web", true));
    let mut monitor = AdaptiveScheduler::new(
        watch_list(["web"]).unwrap(),
        probe.clone(),
        Arc::new(RecordingEventSink::new()),
        Arc::new(SystemTimeProvider),
        config(),
    )
    .unwrap();
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let handle = tokio::spawn(async move { monitor.run(shutdown_rx).await });

    tokio::time::sleep(Duration::from_secs(1)).await;
    drop(shutdown_tx);

    let exit = tokio::time::timeout(Duration::from_millis(10), handle)
        .await
        .expect("monitor should stop promptly")
        .unwrap();
    assert_eq!(exit.rounds, 0);
    assert_eq!(probe.check_count(), 1);
}

/// Cancelling during a slow round discards the in-flight results
#[tokio::test(start_paused = true)]
async fn test_cancel_mid_round_discards_results() {
    let probe = Arc::new(MockStatusProbe::new().with_service("db", false));
    let sink = Arc::new(RecordingEventSink::new());
    let mut monitor = AdaptiveScheduler::new(
        watch_list(["db"]).unwrap(),
        probe.clone(),
        sink.clone(),
        Arc::new(SystemTimeProvider),
        config(),
    )
    .unwrap();
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let handle = tokio::spawn(async move {
        let exit = monitor.run(shutdown_rx).await;
        (monitor, exit)
    });

    // Let the baseline finish, then make the next round slow and changed
    tokio::time::sleep(Duration::from_millis(10)).await;
    probe.set_running("db", true);
    probe.set_delay("db", Duration::from_secs(3));

    // First tick starts at 5s and would finish at 8s
    tokio::time::sleep(Duration::from_millis(6_000)).await;
    assert_eq!(probe.check_count(), 2);
    shutdown_tx.shutdown();

    let (monitor, exit) = handle.await.unwrap();
    assert_eq!(exit.rounds, 0);
    assert_eq!(
        monitor.reporter().state().last_status(&id("db")),
        Some(false)
    );

    // The detached probe still completes on its own
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(probe.completed_check_count(), 2);
    assert_eq!(sink.count(EVENT_STATUS_CHANGED), 0);
}
