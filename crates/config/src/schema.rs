//! Config schema: listener, message store, and static site settings.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub web: WebConfig,
}

/// Listener configuration. HTTP and realtime traffic share this one port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on. Defaults to 3001, which keeps it clear of a
    /// front-end dev server on 3000.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3001,
        }
    }
}

/// Message store connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// sqlx connection string, e.g. `sqlite:parley.db?mode=rwc`.
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:parley.db?mode=rwc".into(),
        }
    }
}

/// Static single-page application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Build output of the client application (the folder holding
    /// `index.html`, not its `public/` sources).
    pub assets_dir: PathBuf,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("../chat-app/dist"),
        }
    }
}
