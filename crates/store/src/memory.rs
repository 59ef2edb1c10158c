use {
    async_trait::async_trait,
    parley_protocol::{ChatMessage, MessageId, NewChatMessage},
    tokio::sync::Mutex,
};

use crate::{MessageStore, error::Result};

/// Process-local store. History is lost when the process exits.
#[derive(Default)]
pub struct MemoryMessageStore {
    messages: Mutex<Vec<ChatMessage>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn insert(&self, message: NewChatMessage) -> Result<ChatMessage> {
        let mut messages = self.messages.lock().await;
        let id = MessageId::new(messages.len() as i64 + 1);
        let stored = message.with_id(id);
        messages.push(stored.clone());
        Ok(stored)
    }

    async fn list_all(&self) -> Result<Vec<ChatMessage>> {
        Ok(self.messages.lock().await.clone())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.messages.lock().await.len() as u64)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, chrono::Utc};

    #[tokio::test]
    async fn ids_count_up_from_one() {
        let store = MemoryMessageStore::new();
        let a = store
            .insert(NewChatMessage::new("alice", "hi", Utc::now()))
            .await
            .unwrap();
        let b = store
            .insert(NewChatMessage::new("bob", "yo", Utc::now()))
            .await
            .unwrap();
        assert_eq!(a.id, Some(MessageId::new(1)));
        assert_eq!(b.id, Some(MessageId::new(2)));
        assert_eq!(store.list_all().await.unwrap(), vec![a, b]);
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
