// Event sink adapters
//
// TracingEventSink mirrors UI events into the log stream.
// JsonLinesEventSink writes one JSON object per event for a UI process
// reading our stdout.

use serde_json::{json, Value};
use std::io::{self, Write};
use std::thread;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use valet_core::port::{EventSink, EVENT_LOG, EVENT_STATUS_CHANGED};

pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &str, payload: Value) {
        match event {
            EVENT_STATUS_CHANGED => info!(
                target: "valet::events",
                service = payload["name"].as_str().unwrap_or("?"),
                is_running = payload["isRunning"].as_bool().unwrap_or(false),
                "{}",
                payload["message"].as_str().unwrap_or("")
            ),
            EVENT_LOG => {
                let message = payload["message"].as_str().unwrap_or("");
                match payload["level"].as_str() {
                    Some("warning") => warn!(target: "valet::events", "{}", message),
                    Some("error") => error!(target: "valet::events", "{}", message),
                    _ => info!(target: "valet::events", "{}", message),
                }
            }
            other => debug!(event = %other, payload = %payload, "Event emitted"),
        }
    }
}

/// Lines buffered ahead of a slow consumer before events are dropped
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// One JSON object per event, written from a dedicated thread
///
/// `emit` never blocks: lines go through a bounded channel and are dropped
/// with a warning once `capacity` lines are waiting on the writer.
pub struct JsonLinesEventSink<W: Write + Send + 'static> {
    tx: mpsc::Sender<String>,
    writer: thread::JoinHandle<W>,
}

impl<W: Write + Send + 'static> JsonLinesEventSink<W> {
    pub fn new(writer: W) -> io::Result<Self> {
        Self::with_capacity(writer, DEFAULT_EVENT_BUFFER)
    }

    pub fn with_capacity(writer: W, capacity: usize) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let writer = thread::Builder::new()
            .name("valet-events".to_string())
            .spawn(move || write_lines(writer, rx))?;
        Ok(Self { tx, writer })
    }

    /// Close the channel, wait for queued lines to be written, return the writer
    ///
    /// `None` if the writer thread panicked.
    pub fn into_inner(self) -> Option<W> {
        drop(self.tx);
        self.writer.join().ok()
    }
}

impl JsonLinesEventSink<io::Stdout> {
    pub fn stdout() -> io::Result<Self> {
        Self::new(io::stdout())
    }
}

fn write_lines<W: Write>(mut writer: W, mut rx: mpsc::Receiver<String>) -> W {
    let mut broken = false;
    while let Some(line) = rx.blocking_recv() {
        if broken {
            continue;
        }
        let written = writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush());
        if let Err(e) = written {
            // Consumer went away; keep draining so emitters never wait
            warn!(error = %e, "Event stream closed, discarding further events");
            broken = true;
        }
    }
    writer
}

impl<W: Write + Send + 'static> EventSink for JsonLinesEventSink<W> {
    fn emit(&self, event: &str, payload: Value) {
        let line = json!({ "event": event, "payload": payload }).to_string();
        match self.tx.try_send(line) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(event = %event, "Event consumer is not keeping up, dropping event")
            }
            Err(TrySendError::Closed(_)) => {
                warn!(event = %event, "Event writer stopped, dropping event")
            }
        }
    }
}
