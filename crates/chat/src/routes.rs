use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        body::Bytes,
        extract::{ConnectInfo, State, WebSocketUpgrade},
        http::{Extensions, StatusCode},
        response::{IntoResponse, Json},
        routing::{get, post},
    },
    parley_protocol::endpoints,
};

use crate::{error::Result, service::ChatService, ws::handle_connection};

/// Chat HTTP routes plus the WebSocket upgrade endpoint.
pub fn chat_router(service: Arc<ChatService>) -> Router {
    Router::new()
        .route(
            endpoints::GET_ALL_MESSAGES,
            get(get_all_messages).post(get_all_messages),
        )
        .route(endpoints::SEND_MESSAGE, post(send_message))
        .route(endpoints::WS, get(ws_upgrade_handler))
        .with_state(service)
}

async fn get_all_messages(State(service): State<Arc<ChatService>>) -> Result<impl IntoResponse> {
    Ok(Json(service.history().await?))
}

/// The body is read raw and parsed here so malformed JSON (or bytes that are
/// not UTF-8) gets the same error envelope as a failed validation.
async fn send_message(State(service): State<Arc<ChatService>>, body: Bytes) -> Result<StatusCode> {
    let raw: serde_json::Value = serde_json::from_slice(&body)?;
    service.post(raw).await?;
    Ok(StatusCode::OK)
}

async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    extensions: Extensions,
    State(service): State<Arc<ChatService>>,
) -> impl IntoResponse {
    let remote_addr = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let channel = Arc::clone(service.channel());
    ws.on_upgrade(move |socket| handle_connection(socket, channel, remote_addr))
}
