use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    parley_protocol::{ChatMessage, MessageId, NewChatMessage},
    sqlx::{SqlitePool, sqlite::SqlitePoolOptions},
    tracing::{debug, info},
};

use crate::{
    MessageStore,
    error::{Context, Error, Result},
};

/// Stores messages in a SQLite database.
#[derive(Clone)]
pub struct SqliteMessageStore {
    pool: SqlitePool,
}

impl SqliteMessageStore {
    /// Wrap an existing pool. The schema must already be migrated.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open `url`, run migrations and return the store.
    ///
    /// An in-memory database lives only as long as its connection, so
    /// `sqlite::memory:` URLs get a single connection that is never recycled.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options.connect(url).await?;
        crate::run_migrations(&pool).await?;
        info!(url, "message store ready");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn insert(&self, message: NewChatMessage) -> Result<ChatMessage> {
        let result =
            sqlx::query("INSERT INTO messages (sender_name, body, date_time) VALUES (?, ?, ?)")
                .bind(&message.sender_name)
                .bind(&message.body)
                .bind(message.date_time.timestamp_millis())
                .execute(&self.pool)
                .await?;
        let id = MessageId::new(result.last_insert_rowid());
        debug!(%id, sender = %message.sender_name, "message stored");
        Ok(message.with_id(id))
    }

    async fn list_all(&self) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, sender_name, body, date_time FROM messages ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ChatMessage::try_from).collect()
    }

    async fn count(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        u64::try_from(count).context("negative message count")
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    sender_name: String,
    body: String,
    date_time: i64,
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = Error;

    fn try_from(r: MessageRow) -> Result<Self> {
        let date_time: DateTime<Utc> = DateTime::from_timestamp_millis(r.date_time).ok_or(
            Error::InvalidTimestamp {
                id: r.id,
                millis: r.date_time,
            },
        )?;
        Ok(Self {
            id: Some(MessageId::new(r.id)),
            date_time,
            sender_name: r.sender_name,
            body: r.body,
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone};

    async fn memory_store() -> SqliteMessageStore {
        SqliteMessageStore::connect("sqlite::memory:").await.unwrap()
    }

    fn message(sender: &str, body: &str, minute: u32) -> NewChatMessage {
        NewChatMessage::new(
            sender,
            body,
            Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let store = memory_store().await;
        assert!(store.list_all().await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_assigns_distinct_ids() {
        let store = memory_store().await;
        let a = store.insert(message("alice", "hi", 0)).await.unwrap();
        let b = store.insert(message("bob", "hey", 1)).await.unwrap();
        assert!(a.id.is_some());
        assert!(b.id.is_some());
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn list_returns_every_insert_in_order() {
        let store = memory_store().await;
        for i in 0..5 {
            store
                .insert(message("alice", &format!("msg {i}"), i))
                .await
                .unwrap();
        }
        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(store.count().await.unwrap(), 5);
        let bodies: Vec<_> = all.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["msg 0", "msg 1", "msg 2", "msg 3", "msg 4"]);
    }

    #[tokio::test]
    async fn timestamps_survive_with_millisecond_precision() {
        let store = memory_store().await;
        let at = Utc.timestamp_millis_opt(1_704_067_200_123).unwrap();
        let stored = store
            .insert(NewChatMessage::new("alice", "hi", at))
            .await
            .unwrap();
        let all = store.list_all().await.unwrap();
        assert_eq!(all, vec![stored]);
        assert_eq!(all[0].date_time, at);
    }

    #[tokio::test]
    async fn history_persists_across_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("chat.db").display());

        let first = SqliteMessageStore::connect(&url).await.unwrap();
        first.insert(message("alice", "hi", 0)).await.unwrap();
        first.pool().close().await;

        let second = SqliteMessageStore::connect(&url).await.unwrap();
        let all = second.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].sender_name, "alice");
    }
}
