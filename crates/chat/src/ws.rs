use std::{net::SocketAddr, sync::Arc};

use {
    axum::extract::ws::{Message, WebSocket},
    futures::{SinkExt, stream::StreamExt},
    parley_protocol::{ClientFrame, ErrorShape, MAX_PAYLOAD_BYTES, error_codes},
    tokio::sync::mpsc,
    tracing::{debug, info, warn},
};

use crate::realtime::{ConnectedClient, RealtimeChannel};

/// Handle a single WebSocket connection: register → message loop → cleanup.
///
/// Frames from one connection are dispatched one at a time, in arrival order.
pub async fn handle_connection(
    socket: WebSocket,
    channel: Arc<RealtimeChannel>,
    remote_addr: Option<SocketAddr>,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    info!(
        conn_id = %conn_id,
        remote = ?remote_addr,
        "ws: new connection"
    );

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (client_tx, mut client_rx) = mpsc::unbounded_channel::<String>();

    // Write loop: forwards queued frames to the socket.
    let write_conn_id = conn_id.clone();
    let write_handle = tokio::spawn(async move {
        while let Some(msg) = client_rx.recv().await {
            if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                debug!(conn_id = %write_conn_id, "ws: write loop closed");
                break;
            }
        }
    });

    channel
        .register_client(ConnectedClient::new(&conn_id, remote_addr, client_tx))
        .await;

    // ── Message loop ─────────────────────────────────────────────────────

    while let Some(msg) = ws_rx.next().await {
        let text = match msg {
            Ok(Message::Text(t)) => t.to_string(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(conn_id = %conn_id, error = %e, "ws: read error");
                break;
            },
        };

        if text.len() > MAX_PAYLOAD_BYTES {
            warn!(conn_id = %conn_id, size = text.len(), "ws: payload too large");
            let err = ErrorShape::new(error_codes::PAYLOAD_TOO_LARGE, "payload too large")
                .with_details(serde_json::json!({ "maxBytes": MAX_PAYLOAD_BYTES }));
            channel.send_error(&conn_id, &err).await;
            continue;
        }

        let ClientFrame::Event(inbound) = match serde_json::from_str(&text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "ws: invalid frame");
                let err = ErrorShape::new(error_codes::INVALID_REQUEST, format!("invalid frame: {e}"));
                channel.send_error(&conn_id, &err).await;
                continue;
            },
        };

        debug!(conn_id = %conn_id, event = %inbound.event, "ws: received event");
        channel.dispatch(&conn_id, inbound).await;
    }

    // ── Cleanup ──────────────────────────────────────────────────────────

    let duration = channel
        .remove_client(&conn_id)
        .await
        .map(|c| c.connected_at.elapsed())
        .unwrap_or_default();

    info!(
        conn_id = %conn_id,
        duration_secs = duration.as_secs(),
        "ws: connection closed"
    );

    write_handle.abort();
}
