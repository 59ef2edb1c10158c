use std::{path::PathBuf, sync::Arc};

use {
    async_trait::async_trait,
    axum::{Router, handler::Handler, routing::get},
    parley_gateway::{HostContext, PluginKind, ServerPlugin},
    tower_http::services::ServeDir,
    tracing::{info, warn},
};

use crate::{
    assets::SiteRoot,
    spa::{entry_handler, spa_fallback},
};

/// Serves the client application and answers every request no other plugin
/// claimed.
pub struct StaticSitePlugin {
    site: Arc<SiteRoot>,
}

impl StaticSitePlugin {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            site: Arc::new(SiteRoot::new(assets_dir)),
        }
    }
}

#[async_trait]
impl ServerPlugin for StaticSitePlugin {
    fn name(&self) -> &str {
        "static-site"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::Fallback
    }

    async fn initialize(&mut self, _host: &HostContext) -> anyhow::Result<()> {
        match self.site.check() {
            Ok(()) => info!(root = %self.site.path().display(), "serving static site"),
            // Missing files only degrade to 404s; the API keeps working.
            Err(e) => warn!(error = %e, "static site incomplete"),
        }
        Ok(())
    }

    fn register_routes(&self, _host: &HostContext, router: Router) -> Router {
        let files = ServeDir::new(self.site.path())
            .fallback(spa_fallback.with_state(Arc::clone(&self.site)));
        let site = Router::new()
            .route("/", get(entry_handler))
            .fallback_service(files)
            .with_state(Arc::clone(&self.site));
        router.merge(site)
    }
}
