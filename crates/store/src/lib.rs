//! Durable chat history.
//!
//! The store assigns each message its id on insert and returns history in
//! insertion order. [`SqliteMessageStore`] is the production backend;
//! [`MemoryMessageStore`] keeps everything in process for tests and tooling.

pub mod error;
pub mod memory;
pub mod sqlite;

use {
    async_trait::async_trait,
    parley_protocol::{ChatMessage, NewChatMessage},
};

pub use {
    error::{Error, Result},
    memory::MemoryMessageStore,
    sqlite::SqliteMessageStore,
};

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist `message` and return it with its newly assigned id.
    async fn insert(&self, message: NewChatMessage) -> Result<ChatMessage>;

    /// Every stored message, oldest first.
    async fn list_all(&self) -> Result<Vec<ChatMessage>>;

    async fn count(&self) -> Result<u64>;
}

/// Run database migrations for the message store.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
