//! Server-sent event adapter for run progress.
//!
//! Each [`ProgressEvent`] becomes one `data:` record carrying its JSON form.
//! The stream ends right after the first terminal event, or when the run
//! drops its sender.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use sbgen_models::ProgressEvent;

use crate::metrics;

/// Fallback record when an event cannot be serialized.
const SERIALIZATION_FAILURE: &str = r#"{"type":"error","message":"Failed to encode progress event"}"#;

/// Bridges a run's event channel to an HTTP event stream.
pub struct StreamingProgressChannel {
    rx: UnboundedReceiver<ProgressEvent>,
}

/// Keeps the active-stream gauge accurate however the stream ends.
struct ActiveStreamGuard;

impl ActiveStreamGuard {
    fn open() -> Self {
        metrics::record_stream_opened();
        Self
    }
}

impl Drop for ActiveStreamGuard {
    fn drop(&mut self) {
        metrics::record_stream_closed();
    }
}

struct StreamState {
    rx: UnboundedReceiver<ProgressEvent>,
    finished: bool,
    _guard: ActiveStreamGuard,
}

impl StreamingProgressChannel {
    pub fn new(rx: UnboundedReceiver<ProgressEvent>) -> Self {
        Self { rx }
    }

    /// Encode one event as an SSE record.
    pub fn encode(event: &ProgressEvent) -> Event {
        match serde_json::to_string(event) {
            Ok(json) => Event::default().data(json),
            Err(e) => {
                warn!("Failed to serialize progress event: {}", e);
                Event::default().data(SERIALIZATION_FAILURE)
            }
        }
    }

    /// Turn the channel into a stream of SSE records.
    pub fn into_stream(self) -> impl Stream<Item = Result<Event, Infallible>> {
        let state = StreamState {
            rx: self.rx,
            finished: false,
            _guard: ActiveStreamGuard::open(),
        };

        stream::unfold(state, |mut state| async move {
            if state.finished {
                return None;
            }
            let Some(event) = state.rx.recv().await else {
                debug!("Run closed its event channel without a terminal event");
                return None;
            };
            state.finished = event.is_terminal();
            metrics::record_event_sent(event.event_type().as_str());
            Some((Ok(Self::encode(&event)), state))
        })
    }

    /// Build the SSE response.
    pub fn into_sse(self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        Sse::new(self.into_stream()).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("keep-alive"),
        )
    }
}
