// Port Layer - Interfaces for external dependencies

pub mod event_sink;
pub mod status_probe;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use event_sink::{
    emit_serialized, CompositeEventSink, EventSink, EVENT_LOG, EVENT_STATUS_CHANGED,
};
pub use status_probe::{ProbeError, ProbeReading, StatusProbe};
pub use time_provider::{SystemTimeProvider, TimeProvider};
