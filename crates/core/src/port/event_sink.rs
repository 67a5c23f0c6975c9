// Event sink port
//
// Fire-and-forget delivery of named events to whatever listens (UI, log).

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Emitted when a watched service changes state
pub const EVENT_STATUS_CHANGED: &str = "service:status-changed";

/// Emitted for human-readable activity log lines
pub const EVENT_LOG: &str = "service:log";

/// Event delivery port
///
/// Best-effort: no acknowledgement and no failure path back to the caller.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

/// Serialize `payload` and hand it to `sink`
///
/// Serialization failures are logged and the event is dropped.
pub fn emit_serialized<T: Serialize>(sink: &dyn EventSink, event: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => sink.emit(event, value),
        Err(e) => warn!(event = %event, error = %e, "Dropping event with unserializable payload"),
    }
}

/// Fans every emission out to each inner sink, in order
pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl CompositeEventSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for CompositeEventSink {
    fn emit(&self, event: &str, payload: Value) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.emit(event, payload.clone());
            }
            last.emit(event, payload);
        }
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records every emission for later inspection
    #[derive(Default)]
    pub struct RecordingEventSink {
        events: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingEventSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<(String, Value)> {
            self.events.lock().unwrap().clone()
        }

        /// Payloads of all emissions named `event`
        pub fn payloads(&self, event: &str) -> Vec<Value> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|(name, _)| name == event)
                .map(|(_, payload)| payload.clone())
                .collect()
        }

        pub fn count(&self, event: &str) -> usize {
            self.payloads(event).len()
        }

        pub fn clear(&self) {
            self.events.lock().unwrap().clear();
        }
    }

    impl EventSink for RecordingEventSink {
        fn emit(&self, event: &str, payload: Value) {
            self.events
                .lock()
                .unwrap()
                .push((event.to_string(), payload));
        }
    }
}
