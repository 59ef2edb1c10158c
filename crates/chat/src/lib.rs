//! Chat plugin: stores messages and relays them to every connected client.
//!
//! HTTP: `GET|POST /api/get-all-messages`, `POST /api/send-message`.
//! Realtime: `GET /ws`, inbound `send-message`, outbound `message-received`.

pub mod error;
pub mod plugin;
pub mod realtime;
pub mod routes;
pub mod service;
pub mod ws;

pub use {
    error::{Error, Result},
    plugin::ChatPlugin,
    realtime::{ConnectedClient, EventContext, RealtimeChannel},
    service::ChatService,
};
