//! Host server: one router, one listener, many plugins.
//!
//! Lifecycle:
//! 1. Hand every plugin a [`HostContext`] and `initialize` them in list order
//! 2. Register the health endpoint, then each routes plugin in list order
//! 3. Register the fallback plugin last, whatever its list position
//! 4. Install global middleware (request log, body limit, CORS)
//! 5. `listen` binds the port and serves HTTP and WebSocket traffic

pub mod error;
pub mod middleware;
pub mod plugin;
pub mod server;

pub use {
    error::{Error, Result},
    plugin::{HostContext, LifecycleEvent, LifecycleLog, LifecyclePhase, PluginKind, ServerPlugin},
    server::HostServer,
};
