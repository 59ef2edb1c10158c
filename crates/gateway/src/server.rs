use std::{future::Future, net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        extract::{DefaultBodyLimit, State},
        response::{IntoResponse, Json},
        routing::get,
    },
    parley_config::ParleyConfig,
    parley_protocol::{MAX_PAYLOAD_BYTES, endpoints},
    tokio::net::TcpListener,
    tracing::{info, warn},
};

use crate::{
    error::{Error, Result},
    middleware,
    plugin::{HostContext, LifecyclePhase, PluginKind, ServerPlugin},
};

// ── Host server ──────────────────────────────────────────────────────────────

/// Owns the router and, once serving, the listener. Plugins are kept alive
/// for as long as the server is.
pub struct HostServer {
    context: HostContext,
    router: Router,
    plugins: Vec<Box<dyn ServerPlugin>>,
}

impl std::fmt::Debug for HostServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServer")
            .field("bind", &self.context.bind())
            .field("port", &self.context.port())
            .field("plugins", &self.plugin_names())
            .finish()
    }
}

impl HostServer {
    /// Initialize every plugin, then assemble the router.
    ///
    /// Returns only once all routes and middleware are in place, so the
    /// server is ready to serve as soon as this resolves.
    pub async fn new(config: ParleyConfig, mut plugins: Vec<Box<dyn ServerPlugin>>) -> Result<Self> {
        check_single_fallback(&plugins)?;
        let context = HostContext::new(config);

        for plugin in plugins.iter_mut() {
            let name = plugin.name().to_string();
            plugin
                .initialize(&context)
                .await
                .map_err(|e| Error::plugin_init(&name, e))?;
            context
                .lifecycle()
                .record(&name, LifecyclePhase::Initialize);
            info!(plugin = %name, "plugin initialized");
        }

        let health = Arc::new(HealthInfo {
            version: env!("CARGO_PKG_VERSION"),
            plugins: plugins.iter().map(|p| p.name().to_string()).collect(),
        });
        let mut router = Router::new()
            .route(endpoints::HEALTH, get(health_handler))
            .with_state(health);

        let (fallbacks, routes): (Vec<_>, Vec<_>) = plugins
            .iter()
            .partition(|p| p.kind() == PluginKind::Fallback);
        for plugin in routes.into_iter().chain(fallbacks) {
            router = plugin.register_routes(&context, router);
            context
                .lifecycle()
                .record(plugin.name(), LifecyclePhase::RegisterRoutes);
            info!(plugin = %plugin.name(), kind = ?plugin.kind(), "plugin routes registered");
        }

        // Later layers wrap earlier ones: the request log runs first.
        let router = router
            .layer(DefaultBodyLimit::max(MAX_PAYLOAD_BYTES))
            .layer(middleware::permissive_cors())
            .layer(axum::middleware::from_fn(middleware::log_request));

        Ok(Self {
            context,
            router,
            plugins,
        })
    }

    pub fn context(&self) -> &HostContext {
        &self.context
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// The assembled router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured address and serve until Ctrl-C or SIGTERM.
    pub async fn listen(self) -> Result<()> {
        let addr = format!("{}:{}", self.context.bind(), self.context.port());
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener until Ctrl-C or SIGTERM.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        self.serve_with_shutdown(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` resolves, then drain
    /// in-flight requests.
    pub async fn serve_with_shutdown(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let addr = listener.local_addr()?;
        info!(%addr, plugins = ?self.plugin_names(), "listening");

        let Self {
            router, plugins, ..
        } = self;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;

        drop(plugins);
        info!("server stopped");
        Ok(())
    }
}

fn check_single_fallback(plugins: &[Box<dyn ServerPlugin>]) -> Result<()> {
    let mut fallbacks = plugins
        .iter()
        .filter(|p| p.kind() == PluginKind::Fallback)
        .map(|p| p.name().to_string());
    match (fallbacks.next(), fallbacks.next()) {
        (Some(first), Some(second)) => Err(Error::DuplicateFallback { first, second }),
        _ => Ok(()),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

struct HealthInfo {
    version: &'static str,
    plugins: Vec<String>,
}

async fn health_handler(State(health): State<Arc<HealthInfo>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": health.version,
        "plugins": health.plugins,
    }))
}

// ── Shutdown ─────────────────────────────────────────────────────────────────

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
