//! Plugin contract between the host server and route-handling units.

use std::sync::{Arc, Mutex, PoisonError};

use {async_trait::async_trait, axum::Router, parley_config::ParleyConfig};

/// How the host schedules a plugin's route registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    /// Registered in list order, ahead of any fallback.
    Routes,
    /// Catch-all for unmatched requests. Registered after every routes
    /// plugin regardless of list position; at most one per server.
    Fallback,
}

/// A unit of functionality attached to the shared host server.
#[async_trait]
pub trait ServerPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> PluginKind {
        PluginKind::Routes
    }

    /// Acquire resources (stores, channels). Runs for every plugin before
    /// any plugin registers routes. An error aborts server startup.
    async fn initialize(&mut self, host: &HostContext) -> anyhow::Result<()>;

    /// Attach this plugin's routes to the shared router and hand it back.
    fn register_routes(&self, host: &HostContext, router: Router) -> Router;
}

// ── Lifecycle record ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Initialize,
    RegisterRoutes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub plugin: String,
    pub phase: LifecyclePhase,
}

/// Ordered record of plugin lifecycle calls made by the host.
#[derive(Debug, Clone, Default)]
pub struct LifecycleLog {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
}

impl LifecycleLog {
    pub fn record(&self, plugin: &str, phase: LifecyclePhase) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LifecycleEvent {
                plugin: plugin.to_string(),
                phase,
            });
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Plugin names that reached `phase`, in call order.
    pub fn plugins_in(&self, phase: LifecyclePhase) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.phase == phase)
            .map(|e| e.plugin)
            .collect()
    }
}

// ── Host context ─────────────────────────────────────────────────────────────

/// Non-owning view of the host server handed to plugins.
///
/// Plugins read settings and the lifecycle record through it; they cannot
/// reach the listener or drive the server.
#[derive(Debug, Clone)]
pub struct HostContext {
    config: Arc<ParleyConfig>,
    lifecycle: LifecycleLog,
}

impl HostContext {
    pub fn new(config: ParleyConfig) -> Self {
        Self {
            config: Arc::new(config),
            lifecycle: LifecycleLog::default(),
        }
    }

    pub fn bind(&self) -> &str {
        &self.config.server.bind
    }

    pub fn port(&self) -> u16 {
        self.config.server.port
    }

    pub fn config(&self) -> &ParleyConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &LifecycleLog {
        &self.lifecycle
    }
}
