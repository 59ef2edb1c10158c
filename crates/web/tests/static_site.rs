#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for the static site fallback.

use std::{net::SocketAddr, path::Path};

use {
    async_trait::async_trait,
    axum::{Router, routing::get},
    tokio::net::TcpListener,
};

use {
    parley_config::ParleyConfig,
    parley_gateway::{HostContext, HostServer, ServerPlugin},
    parley_web::StaticSitePlugin,
};

const INDEX: &str = "<!doctype html><title>chat</title>";

struct ApiPlugin;

#[async_trait]
impl ServerPlugin for ApiPlugin {
    fn name(&self) -> &str {
        "api"
    }

    async fn initialize(&mut self, _host: &HostContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn register_routes(&self, _host: &HostContext, router: Router) -> Router {
        router.route("/api/get-all-messages", get(|| async { "[]" }))
    }
}

fn build_site(root: &Path) {
    std::fs::create_dir_all(root.join("static/js")).unwrap();
    std::fs::write(root.join("index.html"), INDEX).unwrap();
    std::fs::write(root.join("static/js/app.js"), "console.log('hi');").unwrap();
    std::fs::write(root.join("favicon.ico"), [0u8, 1, 2]).unwrap();
}

async fn serve(root: &Path) -> SocketAddr {
    // The fallback is listed first on purpose; the host still registers it last.
    let server = HostServer::new(ParleyConfig::default(), vec![
        Box::new(StaticSitePlugin::new(root)),
        Box::new(ApiPlugin),
    ])
    .await
    .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        server
            .serve_with_shutdown(listener, std::future::pending())
            .await
            .unwrap();
    });
    addr
}

async fn fetch(addr: SocketAddr, path: &str) -> reqwest::Response {
    reqwest::get(format!("http://{addr}{path}")).await.unwrap()
}

#[tokio::test]
async fn root_serves_entry_document_uncached() {
    let dir = tempfile::tempdir().unwrap();
    build_site(dir.path());
    let addr = serve(dir.path()).await;

    let resp = fetch(addr, "/").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["cache-control"], "no-cache");
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
    assert_eq!(resp.text().await.unwrap(), INDEX);
}

#[tokio::test]
async fn static_assets_are_served_with_their_content_type() {
    let dir = tempfile::tempdir().unwrap();
    build_site(dir.path());
    let addr = serve(dir.path()).await;

    let resp = fetch(addr, "/static/js/app.js").await;
    assert_eq!(resp.status(), 200);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .contains("javascript")
    );
    assert_eq!(resp.text().await.unwrap(), "console.log('hi');");

    let resp = fetch(addr, "/favicon.ico").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), [0u8, 1, 2]);
}

#[tokio::test]
async fn client_routes_get_the_entry_document() {
    let dir = tempfile::tempdir().unwrap();
    build_site(dir.path());
    let addr = serve(dir.path()).await;

    let resp = fetch(addr, "/rooms/general").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), INDEX);
}

#[tokio::test]
async fn missing_files_are_404() {
    let dir = tempfile::tempdir().unwrap();
    build_site(dir.path());
    let addr = serve(dir.path()).await;

    assert_eq!(fetch(addr, "/missing.js").await.status(), 404);
    assert_eq!(fetch(addr, "/static/css/app.css").await.status(), 404);
}

#[tokio::test]
async fn api_routes_win_over_the_fallback() {
    let dir = tempfile::tempdir().unwrap();
    build_site(dir.path());
    let addr = serve(dir.path()).await;

    let resp = fetch(addr, "/api/get-all-messages").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "[]");
}

#[tokio::test]
async fn missing_entry_document_is_404_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    let addr = serve(&dir.path().join("not-built")).await;

    assert_eq!(fetch(addr, "/").await.status(), 404);
    assert_eq!(fetch(addr, "/rooms/general").await.status(), 404);
    assert_eq!(fetch(addr, "/api/get-all-messages").await.status(), 200);
}
