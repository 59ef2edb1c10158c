use std::sync::Arc;

use {
    anyhow::Context,
    async_trait::async_trait,
    axum::Router,
    parley_gateway::{HostContext, ServerPlugin},
    parley_protocol::events,
    parley_store::{MessageStore, SqliteMessageStore},
    tracing::{info, warn},
};

use crate::{
    realtime::RealtimeChannel,
    routes::chat_router,
    service::{ChatService, accept_message},
};

enum StoreSource {
    Url(String),
    Ready(Arc<dyn MessageStore>),
}

/// Message history over HTTP plus realtime fan-out over WebSocket.
pub struct ChatPlugin {
    source: StoreSource,
    service: Option<Arc<ChatService>>,
}

impl ChatPlugin {
    /// Open the SQLite store at `store_url` during initialization.
    pub fn new(store_url: impl Into<String>) -> Self {
        Self {
            source: StoreSource::Url(store_url.into()),
            service: None,
        }
    }

    /// Use an already-open store.
    pub fn with_store(store: Arc<dyn MessageStore>) -> Self {
        Self {
            source: StoreSource::Ready(store),
            service: None,
        }
    }

    /// Available once the plugin has been initialized.
    pub fn service(&self) -> Option<&Arc<ChatService>> {
        self.service.as_ref()
    }
}

fn build_channel(store: &Arc<dyn MessageStore>) -> RealtimeChannel {
    let mut channel = RealtimeChannel::new();
    let store = Arc::clone(store);
    channel.on(
        events::SEND_MESSAGE,
        Box::new(move |ctx| {
            let store = Arc::clone(&store);
            Box::pin(async move {
                accept_message(store.as_ref(), &ctx.channel, ctx.payload)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_error_shape())
            })
        }),
    );
    channel
}

#[async_trait]
impl ServerPlugin for ChatPlugin {
    fn name(&self) -> &str {
        "chat"
    }

    async fn initialize(&mut self, _host: &HostContext) -> anyhow::Result<()> {
        let store: Arc<dyn MessageStore> = match &self.source {
            StoreSource::Url(url) => Arc::new(
                SqliteMessageStore::connect(url)
                    .await
                    .with_context(|| format!("failed to open message store at {url}"))?,
            ),
            StoreSource::Ready(store) => Arc::clone(store),
        };

        let channel = Arc::new(build_channel(&store));
        info!(events = ?channel.event_names(), "chat channel ready");
        self.service = Some(Arc::new(ChatService::new(store, channel)));
        Ok(())
    }

    fn register_routes(&self, _host: &HostContext, router: Router) -> Router {
        match &self.service {
            Some(service) => router.merge(chat_router(Arc::clone(service))),
            None => {
                warn!("chat plugin registered before initialization, no routes added");
                router
            },
        }
    }
}
