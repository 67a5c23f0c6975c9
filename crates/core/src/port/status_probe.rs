// Service status probe port
// reason: async-trait for object-safe async ports
use async_trait::async_trait;
use thiserror::Error;

/// Raw answer of a platform probe for one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReading {
    pub is_running: bool,
    pub message: String,
}

impl ProbeReading {
    pub fn new(is_running: bool, message: impl Into<String>) -> Self {
        Self {
            is_running,
            message: message.into(),
        }
    }
}

/// Probe errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("`{command}` exited with {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Probe timeout after {0}ms")]
    Timeout(u64),

    #[error("Unsupported platform: {0}")]
    Unsupported(String),

    #[error("Invalid probe output: {0}")]
    InvalidOutput(String),
}

/// Platform service manager port
///
/// One implementation is selected at startup per operating system.
/// Calls may be slow and may fail; callers never assume otherwise.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Report whether `id` is currently running
    ///
    /// # Errors
    /// - ProbeError::SpawnFailed if the service manager cannot be invoked
    /// - ProbeError::Timeout if the service manager does not answer in time
    async fn check_status(&self, id: &str) -> Result<ProbeReading, ProbeError>;

    /// Start `id`
    async fn start(&self, id: &str) -> Result<(), ProbeError>;

    /// Stop `id`
    async fn stop(&self, id: &str) -> Result<(), ProbeError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, Default)]
    struct MockService {
        running: bool,
        check_error: Option<ProbeError>,
        control_error: Option<ProbeError>,
        delay: Option<Duration>,
        panic_on_check: bool,
    }

    /// Scriptable in-memory service manager
    #[derive(Default)]
    pub struct MockStatusProbe {
        services: Mutex<HashMap<String, MockService>>,
        checks: AtomicUsize,
        completed_checks: AtomicUsize,
        control_log: Mutex<Vec<String>>,
    }

    impl MockStatusProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_service(self, id: &str, running: bool) -> Self {
            self.set_running(id, running);
            self
        }

        pub fn set_running(&self, id: &str, running: bool) {
            self.services
                .lock()
                .unwrap()
                .entry(id.to_string())
                .or_default()
                .running = running;
        }

        pub fn fail_checks(&self, id: &str, error: ProbeError) {
            self.services
                .lock()
                .unwrap()
                .entry(id.to_string())
                .or_default()
                .check_error = Some(error);
        }

        pub fn fail_control(&self, id: &str, error: ProbeError) {
            self.services
                .lock()
                .unwrap()
                .entry(id.to_string())
                .or_default()
                .control_error = Some(error);
        }

        pub fn set_delay(&self, id: &str, delay: Duration) {
            self.services
                .lock()
                .unwrap()
                .entry(id.to_string())
                .or_default()
                .delay = Some(delay);
        }

        pub fn panic_on_check(&self, id: &str) {
            self.services
                .lock()
                .unwrap()
                .entry(id.to_string())
                .or_default()
                .panic_on_check = true;
        }

        /// Number of status checks started
        pub fn check_count(&self) -> usize {
            self.checks.load(Ordering::SeqCst)
        }

        /// Number of status checks that returned (successfully or not)
        pub fn completed_check_count(&self) -> usize {
            self.completed_checks.load(Ordering::SeqCst)
        }

        /// Start/stop requests in call order, e.g. `["start nginx"]`
        pub fn control_log(&self) -> Vec<String> {
            self.control_log.lock().unwrap().clone()
        }

        fn control(&self, verb: &str, id: &str, running: bool) -> Result<(), ProbeError> {
            self.control_log
                .lock()
                .unwrap()
                .push(format!("{} {}", verb, id));
            let mut services = self.services.lock().unwrap();
            let service = services.entry(id.to_string()).or_default();
            if let Some(err) = service.control_error.clone() {
                return Err(err);
            }
            service.running = running;
            Ok(())
        }
    }

    #[async_trait]
    impl StatusProbe for MockStatusProbe {
        async fn check_status(&self, id: &str) -> Result<ProbeReading, ProbeError> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            let service = self.services.lock().unwrap().get(id).cloned();
            let service = service.ok_or_else(|| ProbeError::CommandFailed {
                command: format!("status {}", id),
                code: Some(4),
                stderr: format!("Unit {} could not be found.", id),
            })?;

            if let Some(delay) = service.delay {
                tokio::time::sleep(delay).await;
            }
            if service.panic_on_check {
                panic!("probe for {} panicked", id);
            }
            self.completed_checks.fetch_add(1, Ordering::SeqCst);

            if let Some(err) = service.check_error {
                return Err(err);
            }
            let message = if service.running {
                format!("{} is running", id)
            } else {
                format!("{} is stopped", id)
            };
            Ok(ProbeReading::new(service.running, message))
        }

        async fn start(&self, id: &str) -> Result<(), ProbeError> {
            self.control("start", id, true)
        }

        async fn stop(&self, id: &str) -> Result<(), ProbeError> {
            self.control("stop", id, false)
        }
    }
}
