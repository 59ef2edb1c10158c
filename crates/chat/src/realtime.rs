//! Realtime channel: connected WebSocket clients and named event handlers.

use std::{
    collections::HashMap,
    future::Future,
    net::SocketAddr,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use {
    parley_protocol::{ErrorShape, EventFrame, InboundEvent, error_codes, events},
    tokio::sync::{RwLock, mpsc},
    tracing::{debug, warn},
};

// ── Clients ──────────────────────────────────────────────────────────────────

/// A connected WebSocket client.
#[derive(Debug)]
pub struct ConnectedClient {
    pub conn_id: String,
    pub remote_addr: Option<SocketAddr>,
    /// Feeds the connection's write loop with serialized frames.
    sender: mpsc::UnboundedSender<String>,
    pub connected_at: Instant,
}

impl ConnectedClient {
    pub fn new(
        conn_id: impl Into<String>,
        remote_addr: Option<SocketAddr>,
        sender: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            conn_id: conn_id.into(),
            remote_addr,
            sender,
            connected_at: Instant::now(),
        }
    }

    /// Queue a serialized frame. `false` once the write loop has gone away.
    pub fn send(&self, frame: &str) -> bool {
        self.sender.send(frame.to_string()).is_ok()
    }
}

// ── Event handlers ───────────────────────────────────────────────────────────

/// Everything an event handler learns about the frame it is handling.
pub struct EventContext {
    pub conn_id: String,
    pub event: String,
    pub payload: serde_json::Value,
    pub channel: Arc<RealtimeChannel>,
}

pub type EventResult = Result<(), ErrorShape>;

pub type EventHandlerFn =
    Box<dyn Fn(EventContext) -> Pin<Box<dyn Future<Output = EventResult> + Send>> + Send + Sync>;

// ── Channel ──────────────────────────────────────────────────────────────────

/// Client registry plus named-event dispatch.
///
/// Handlers are registered up front with [`RealtimeChannel::on`]; the channel
/// is then shared behind an `Arc` by the WebSocket route and by anything that
/// broadcasts.
#[derive(Default)]
pub struct RealtimeChannel {
    clients: RwLock<HashMap<String, ConnectedClient>>,
    handlers: HashMap<String, EventHandlerFn>,
    seq: AtomicU64,
}

impl RealtimeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for inbound events named `event`, replacing any
    /// previous one.
    pub fn on(&mut self, event: impl Into<String>, handler: EventHandlerFn) {
        self.handlers.insert(event.into(), handler);
    }

    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub async fn register_client(&self, client: ConnectedClient) {
        let conn_id = client.conn_id.clone();
        self.clients.write().await.insert(conn_id, client);
    }

    pub async fn remove_client(&self, conn_id: &str) -> Option<ConnectedClient> {
        self.clients.write().await.remove(conn_id)
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    fn frame(&self, event: &str, payload: serde_json::Value) -> Option<String> {
        let frame = EventFrame::new(event, payload, self.next_seq());
        match serde_json::to_string(&frame) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(event, error = %e, "failed to serialize event frame");
                None
            },
        }
    }

    /// Queue `event` for every connected client. Delivery is not awaited;
    /// returns how many clients accepted the frame.
    ///
    /// The sequence number is taken under the exclusive registry lock, so
    /// every client sees `seq` strictly increasing.
    pub async fn broadcast(&self, event: &str, payload: serde_json::Value) -> usize {
        let clients = self.clients.write().await;
        let Some(json) = self.frame(event, payload) else {
            return 0;
        };
        debug!(event, clients = clients.len(), "broadcasting event");
        clients.values().filter(|c| c.send(&json)).count()
    }

    /// Queue `event` for a single client. `false` if it is not connected.
    pub async fn send_to(&self, conn_id: &str, event: &str, payload: serde_json::Value) -> bool {
        let clients = self.clients.write().await;
        let Some(client) = clients.get(conn_id) else {
            return false;
        };
        self.frame(event, payload)
            .is_some_and(|json| client.send(&json))
    }

    /// Tell one client its last frame was rejected.
    pub async fn send_error(&self, conn_id: &str, error: &ErrorShape) -> bool {
        match serde_json::to_value(error) {
            Ok(payload) => self.send_to(conn_id, events::ERROR, payload).await,
            Err(e) => {
                warn!(conn_id, error = %e, "failed to serialize error shape");
                false
            },
        }
    }

    /// Run the handler registered for `inbound.event`. Unknown events and
    /// handler failures are reported to the sending client only.
    pub async fn dispatch(self: &Arc<Self>, conn_id: &str, inbound: InboundEvent) {
        let Some(handler) = self.handlers.get(&inbound.event) else {
            warn!(conn_id, event = %inbound.event, "unknown event");
            let err = ErrorShape::new(
                error_codes::UNKNOWN_EVENT,
                format!("unknown event: {}", inbound.event),
            );
            self.send_error(conn_id, &err).await;
            return;
        };

        let ctx = EventContext {
            conn_id: conn_id.to_string(),
            event: inbound.event,
            payload: inbound.payload,
            channel: Arc::clone(self),
        };
        if let Err(err) = handler(ctx).await {
            debug!(conn_id, code = %err.code, "event rejected");
            self.send_error(conn_id, &err).await;
        }
    }
}
