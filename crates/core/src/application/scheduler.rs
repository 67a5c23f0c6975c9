//! Adaptive scheduler - drives polling rounds on a two-speed cadence
//!
//! Idle-Slow --change--> Active-Fast --quiet round--> Idle-Slow
//!
//! A baseline round seeds the reporter before the first tick. Cancellation
//! is checked at every tick boundary and also interrupts the wait between
//! ticks and the wait on an in-flight round; interrupted rounds are never
//! applied.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use super::config::MonitorConfig;
use super::poller::ConcurrentPoller;
use super::reporter::ChangeReporter;
use super::shutdown::ShutdownToken;
use crate::domain::{LogEntry, LogLevel, Platform, ServiceId, ServiceStatus};
use crate::error::{AppError, Result};
use crate::port::{emit_serialized, EventSink, StatusProbe, TimeProvider, EVENT_LOG};

/// Milliseconds in `duration`, saturating at `u64::MAX`
fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Polling speed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    IdleSlow,
    ActiveFast,
}

impl Cadence {
    /// Cadence after a round that changed `changed` services
    pub fn next(self, changed: usize) -> Self {
        if changed > 0 {
            Cadence::ActiveFast
        } else {
            Cadence::IdleSlow
        }
    }

    pub fn interval(self, config: &MonitorConfig) -> Duration {
        match self {
            Cadence::IdleSlow => config.slow_interval,
            Cadence::ActiveFast => config.fast_interval,
        }
    }
}

/// Lifecycle of a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    /// Baseline not taken yet
    Starting,
    Running(Cadence),
    /// Terminal
    Stopped,
}

/// Result of one applied polling round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundOutcome {
    pub changed: usize,
    pub cadence: Cadence,
    pub next_interval: Duration,
}

/// Summary returned when the monitor stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorExit {
    /// Applied rounds, baseline excluded
    pub rounds: u64,
}

pub struct AdaptiveScheduler {
    services: Vec<ServiceId>,
    poller: ConcurrentPoller,
    reporter: ChangeReporter,
    sink: Arc<dyn EventSink>,
    time_provider: Arc<dyn TimeProvider>,
    config: MonitorConfig,
    phase: MonitorPhase,
    rounds: u64,
}

impl AdaptiveScheduler {
    /// Create a monitor over a fixed watch list
    ///
    /// # Errors
    /// - AppError::Config if the timing configuration is invalid
    /// - AppError::Validation if the watch list is empty
    pub fn new(
        services: Vec<ServiceId>,
        probe: Arc<dyn StatusProbe>,
        sink: Arc<dyn EventSink>,
        time_provider: Arc<dyn TimeProvider>,
        config: MonitorConfig,
    ) -> Result<Self> {
        config.validate()?;
        if services.is_empty() {
            return Err(AppError::Validation(
                "monitor needs at least one service".to_string(),
            ));
        }

        let reporter =
            ChangeReporter::new(&services, sink.clone(), time_provider.clone(), &config);
        Ok(Self {
            services,
            poller: ConcurrentPoller::new(probe),
            reporter,
            sink,
            time_provider,
            config,
            phase: MonitorPhase::Starting,
            rounds: 0,
        })
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    pub fn services(&self) -> &[ServiceId] {
        &self.services
    }

    pub fn reporter(&self) -> &ChangeReporter {
        &self.reporter
    }

    /// Interval until the next tick
    pub fn next_interval(&self) -> Duration {
        match self.phase {
            MonitorPhase::Running(cadence) => cadence.interval(&self.config),
            _ => self.config.slow_interval,
        }
    }

    /// Poll once and seed the reporter; emits nothing
    pub async fn baseline(&mut self) {
        let round = self.poller.poll_all(&self.services).await;
        self.apply_baseline(&round);
    }

    /// Poll once and report changes
    pub async fn tick(&mut self) -> RoundOutcome {
        let round = self.poller.poll_all(&self.services).await;
        self.apply(&round)
    }

    fn apply_baseline(&mut self, round: &[ServiceStatus]) {
        self.reporter.seed(round);
        self.phase = MonitorPhase::Running(Cadence::IdleSlow);
    }

    fn apply(&mut self, round: &[ServiceStatus]) -> RoundOutcome {
        let changed = self.reporter.report(round);
        let previous = match self.phase {
            MonitorPhase::Running(cadence) => cadence,
            _ => Cadence::IdleSlow,
        };
        let cadence = previous.next(changed);
        if cadence != previous {
            info!(from = ?previous, to = ?cadence, changed, "Poll cadence switched");
        }
        self.phase = MonitorPhase::Running(cadence);
        self.rounds += 1;

        RoundOutcome {
            changed,
            cadence,
            next_interval: cadence.interval(&self.config),
        }
    }

    /// Run until `shutdown` fires
    ///
    /// Should be spawned in tokio::spawn
    pub async fn run(&mut self, mut shutdown: ShutdownToken) -> MonitorExit {
        info!(
            services = self.services.len(),
            slow_ms = whole_millis(self.config.slow_interval),
            fast_ms = whole_millis(self.config.fast_interval),
            "Service monitor started"
        );
        let entry = LogEntry::at(
            self.time_provider.now_millis(),
            LogLevel::Info,
            format!(
                "Valet monitor started on {} watching {} services",
                Platform::current(),
                self.services.len()
            ),
        );
        emit_serialized(self.sink.as_ref(), EVENT_LOG, &entry);

        if self.phase == MonitorPhase::Starting || self.phase == MonitorPhase::Stopped {
            let baseline = tokio::select! {
                biased;
                _ = shutdown.wait() => None,
                round = self.poller.poll_all(&self.services) => Some(round),
            };
            match baseline {
                Some(round) if !shutdown.is_shutdown() => self.apply_baseline(&round),
                _ => return self.stop("baseline"),
            }
        }

        loop {
            if shutdown.is_shutdown() {
                return self.stop("tick boundary");
            }

            let interval = self.next_interval();
            tokio::select! {
                biased;
                _ = shutdown.wait() => return self.stop("idle wait"),
                _ = sleep(interval) => {}
            }

            let round = tokio::select! {
                biased;
                _ = shutdown.wait() => None,
                round = self.poller.poll_all(&self.services) => Some(round),
            };
            let round = match round {
                Some(round) if !shutdown.is_shutdown() => round,
                _ => return self.stop("polling round"),
            };

            let outcome = self.apply(&round);
            debug!(
                round = self.rounds,
                changed = outcome.changed,
                next_ms = whole_millis(outcome.next_interval),
                "Polling round applied"
            );
        }
    }

    fn stop(&mut self, during: &str) -> MonitorExit {
        self.phase = MonitorPhase::Stopped;
        info!(rounds = self.rounds, during, "Service monitor stopped");
        MonitorExit {
            rounds: self.rounds,
        }
    }
}
