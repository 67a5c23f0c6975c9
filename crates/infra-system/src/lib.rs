// Valet Infrastructure - System Adapters
// Implements: StatusProbe (systemctl, brew), EventSink (tracing, JSON lines)

pub mod brew_probe;
pub mod command;
pub mod event_sink_impl;
pub mod platform;
pub mod systemctl_probe;

pub use brew_probe::BrewProbe;
pub use event_sink_impl::{JsonLinesEventSink, TracingEventSink};
pub use platform::{default_probe, probe_for, DEFAULT_COMMAND_TIMEOUT};
pub use systemctl_probe::{Elevation, SystemctlProbe};
