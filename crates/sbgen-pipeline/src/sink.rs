//! Progress event sinks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use sbgen_models::{ProgressEvent, ProgressEventType};

/// Receives progress events from a run.
///
/// `emit` never blocks and never fails; a sink whose consumer has gone away
/// silently drops events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);

    /// Whether anyone is still listening.
    fn is_connected(&self) -> bool {
        true
    }
}

/// Sink backed by an unbounded channel, consumed by the HTTP stream.
///
/// Events after the first terminal event are dropped.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    connected: AtomicBool,
    terminated: AtomicBool,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            tx,
            connected: AtomicBool::new(true),
            terminated: AtomicBool::new(false),
        };
        (sink, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        if self.terminated.load(Ordering::SeqCst) {
            debug!(event_type = event.event_type().as_str(), "Dropping event after terminal event");
            return;
        }
        if event.is_terminal() {
            self.terminated.store(true, Ordering::SeqCst);
        }
        if !self.connected.load(Ordering::SeqCst) {
            return;
        }
        if self.tx.send(event).is_err() {
            debug!("Progress consumer disconnected, further events are dropped");
            self.connected.store(false, Ordering::SeqCst);
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.tx.is_closed()
    }
}

/// Sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn event_types(&self) -> Vec<ProgressEventType> {
        self.events().iter().map(ProgressEvent::event_type).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.emit(ProgressEvent::progress(1, 4, "a", 10));
        sink.emit(ProgressEvent::content("b"));
        sink.emit(ProgressEvent::error("c"));
        sink.emit(ProgressEvent::content("after terminal"));
        drop(sink);

        let mut received = Vec::new();
        while let Some(event) = rx.recv().await {
            received.push(event.event_type());
        }
        assert_eq!(
            received,
            vec![
                ProgressEventType::Progress,
                ProgressEventType::Content,
                ProgressEventType::Error
            ]
        );
    }

    #[test]
    fn test_channel_sink_survives_disconnect() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(ProgressEvent::content("nobody listening"));
        sink.emit(ProgressEvent::content("still fine"));
        assert!(!sink.is_connected());
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::new();
        sink.emit(ProgressEvent::content("x"));
        assert_eq!(sink.event_types(), vec![ProgressEventType::Content]);
    }
}
