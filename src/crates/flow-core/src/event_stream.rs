//! Event stream to a client sink (C13).
//!
//! An `EventStream` pushes named, JSON-payload events toward a client (an
//! SSE connection in the typical deployment, though this trait is
//! transport-agnostic). Two contracts matter more than the wire format:
//!
//! - `push` never raises. A transport failure (client gone) is swallowed
//!   and flips [`EventStream::is_disconnected`] instead, so a slow or
//!   already-departed client can never turn into a node error.
//! - The stream is acquired RAII-style: [`EventStreamGuard`] guarantees a
//!   `done` event on every exit path, success or error, the same way a
//!   scoped resource guard guarantees release.

use crate::value::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One wire event: a name plus a JSON payload.
#[derive(Debug, Clone)]
pub struct StreamEvent {
    pub name: String,
    pub payload: Value,
}

/// Push-only sink to a client. Implementations must never let a transport
/// error escape `push` — swallow it and set the disconnected flag.
pub trait EventStream: Send + Sync {
    /// Send `name`/`payload` toward the client. Idempotent with respect to
    /// failures: calling `push` after disconnect is a harmless no-op.
    fn push(&self, name: &str, payload: Value);

    /// Probe before every emission (per §5); once true, further `push`
    /// calls are no-ops but the flow itself may continue to completion.
    fn is_disconnected(&self) -> bool;
}

/// Channel-backed [`EventStream`]. The production shape: events are
/// forwarded over an unbounded `tokio::mpsc` channel to whatever adapts
/// them onto the wire (an SSE handler, a websocket writer, a test
/// collector). Concrete HTTP transports are out of scope for this crate.
pub struct ChannelEventStream {
    tx: mpsc::UnboundedSender<StreamEvent>,
    disconnected: AtomicBool,
}

impl ChannelEventStream {
    /// Create a stream paired with the receiving end of its channel.
    pub fn pair() -> (Arc<Self>, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx, disconnected: AtomicBool::new(false) }), rx)
    }

    /// Simulate a client disconnect (used by tests and by a transport
    /// layer that detects the peer going away).
    pub fn mark_disconnected(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }
}

impl EventStream for ChannelEventStream {
    fn push(&self, name: &str, payload: Value) {
        if self.is_disconnected() {
            return;
        }
        if self
            .tx
            .send(StreamEvent { name: name.to_string(), payload })
            .is_err()
        {
            // Receiver dropped: treat exactly like a client disconnect.
            self.disconnected.store(true, Ordering::SeqCst);
        }
    }

    fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

/// RAII guard around an [`EventStream`] run: guarantees a `done` event is
/// pushed exactly once, on every exit path.
///
/// ```rust,no_run
/// use flow_core::event_stream::{ChannelEventStream, EventStreamGuard};
/// use serde_json::json;
///
/// # async fn demo() {
/// let (stream, mut rx) = ChannelEventStream::pair();
/// {
///     let guard = EventStreamGuard::open(stream);
///     guard.push("msgid", json!({"id": "m1"}));
///     guard.close_ok();
/// }
/// let first = rx.recv().await.unwrap();
/// assert_eq!(first.name, "msgid");
/// let second = rx.recv().await.unwrap();
/// assert_eq!(second.name, "done");
/// # }
/// ```
pub struct EventStreamGuard {
    stream: Arc<dyn EventStream>,
    closed: AtomicBool,
}

impl EventStreamGuard {
    pub fn open(stream: Arc<dyn EventStream>) -> Self {
        Self { stream, closed: AtomicBool::new(false) }
    }

    pub fn push(&self, name: &str, payload: Value) {
        self.stream.push(name, payload);
    }

    pub fn is_disconnected(&self) -> bool {
        self.stream.is_disconnected()
    }

    /// Close the stream successfully: pushes `done` with `status: "ok"`.
    pub fn close_ok(&self) {
        self.close_with(Value::String("ok".into()));
    }

    /// Close the stream after an error: pushes `error` then `done` with
    /// `status: "error"` (§4.6, §7 transient-over-stream handling).
    pub fn close_err(&self, message: impl Into<String>) {
        self.stream.push("error", serde_json::json!({ "message": message.into() }));
        self.close_with(Value::String("error".into()));
    }

    fn close_with(&self, status: Value) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stream.push("done", serde_json::json!({ "status": status }));
    }
}

impl Drop for EventStreamGuard {
    fn drop(&mut self) {
        // Guarantees `done` even if the caller returned early via `?`
        // without calling close_ok/close_err.
        self.close_with(Value::String("error".into()));
    }
}
