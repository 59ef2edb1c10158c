//! Accepting and listing chat messages.

use std::sync::Arc;

use {
    parley_protocol::{ChatMessage, NewChatMessage, events},
    parley_store::MessageStore,
    tracing::{info, warn},
};

use crate::{error::Result, realtime::RealtimeChannel};

/// The chat plugin's shared state: the message store and the realtime
/// channel that fans stored messages out.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn MessageStore>,
    channel: Arc<RealtimeChannel>,
}

impl ChatService {
    pub fn new(store: Arc<dyn MessageStore>, channel: Arc<RealtimeChannel>) -> Self {
        Self { store, channel }
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    pub fn channel(&self) -> &Arc<RealtimeChannel> {
        &self.channel
    }

    /// Full history, oldest first.
    pub async fn history(&self) -> Result<Vec<ChatMessage>> {
        Ok(self.store.list_all().await?)
    }

    /// Validate, persist and broadcast one inbound payload.
    pub async fn post(&self, raw: serde_json::Value) -> Result<ChatMessage> {
        accept_message(self.store.as_ref(), &self.channel, raw).await
    }
}

/// Convert dates, validate, persist, then broadcast `message-received` to
/// every connected client (the sender included).
///
/// Nothing is broadcast unless the store accepted the message, so every
/// broadcast carries a store-assigned id.
pub async fn accept_message(
    store: &dyn MessageStore,
    channel: &RealtimeChannel,
    raw: serde_json::Value,
) -> Result<ChatMessage> {
    let message = NewChatMessage::from_json(raw)?;
    let stored = store.insert(message).await.inspect_err(|e| {
        warn!(error = %e, "failed to store message");
    })?;

    let payload = serde_json::to_value(&stored)?;
    let delivered = channel.broadcast(events::MESSAGE_RECEIVED, payload).await;
    info!(
        id = ?stored.id.map(|id| id.to_string()),
        sender = %stored.sender_name,
        delivered,
        "message accepted"
    );
    Ok(stored)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::realtime::ConnectedClient,
        parley_store::MemoryMessageStore,
        serde_json::json,
        tokio::sync::mpsc,
    };

    fn service() -> ChatService {
        ChatService::new(
            Arc::new(MemoryMessageStore::new()),
            Arc::new(RealtimeChannel::new()),
        )
    }

    #[tokio::test]
    async fn post_persists_then_broadcasts_with_string_id() {
        let svc = service();
        let (tx, mut rx) = mpsc::unbounded_channel();
        svc.channel()
            .register_client(ConnectedClient::new("c1", None, tx))
            .await;

        let stored = svc
            .post(json!({
                "senderName": "alice",
                "message": "hi",
                "dateTime": "2024-01-01T00:00:00.000Z",
            }))
            .await
            .unwrap();

        assert_eq!(svc.history().await.unwrap(), vec![stored.clone()]);
        let frame: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["event"], "message-received");
        assert_eq!(frame["payload"]["id"], stored.id.unwrap().to_string());
        assert_eq!(frame["payload"]["dateTime"], "2024-01-01T00:00:00.000Z");
    }

    #[tokio::test]
    async fn invalid_payload_is_neither_stored_nor_broadcast() {
        let svc = service();
        let (tx, mut rx) = mpsc::unbounded_channel();
        svc.channel()
            .register_client(ConnectedClient::new("c1", None, tx))
            .await;

        let err = svc
            .post(json!({ "senderName": "alice", "message": "hi" }))
            .await
            .unwrap_err();

        assert!(matches!(err, crate::Error::Invalid(_)));
        assert!(svc.history().await.unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn client_supplied_id_is_ignored() {
        let svc = service();
        let stored = svc
            .post(json!({
                "id": "999",
                "senderName": "alice",
                "message": "hi",
                "dateTime": "2024-01-01T00:00:00.000Z",
            }))
            .await
            .unwrap();
        assert_eq!(stored.id.unwrap().to_string(), "1");
    }
}
