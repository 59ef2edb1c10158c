//! Global HTTP middleware installed by the host around every route.

use std::net::SocketAddr;

use {
    axum::{
        body::Body,
        extract::ConnectInfo,
        http::Request,
        middleware::Next,
        response::Response,
    },
    tower_http::cors::{Any, CorsLayer},
    tracing::info,
};

/// Log every request before it reaches its handler.
///
/// The remote address is only known when the server was started with
/// `ConnectInfo`; in-process routers log without it.
pub async fn log_request(request: Request<Body>, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());

    info!(
        method = %request.method(),
        path = %request.uri().path(),
        remote = remote.as_deref().unwrap_or("-"),
        "request"
    );

    next.run(request).await
}

/// Cross-origin requests are accepted from anywhere.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
