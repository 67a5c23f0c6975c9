// Application Layer - Use Cases and Business Logic

pub mod config;
pub mod constants;
pub mod control;
pub mod poller;
pub mod reporter;
pub mod scheduler;
pub mod shutdown;
pub mod snapshot;

// Re-exports
pub use config::MonitorConfig;
pub use control::ServiceControl;
pub use poller::ConcurrentPoller;
pub use reporter::{window_elapsed, ChangeReporter, MonitorState};
pub use scheduler::{AdaptiveScheduler, Cadence, MonitorExit, MonitorPhase, RoundOutcome};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use snapshot::StatusSnapshotter;
