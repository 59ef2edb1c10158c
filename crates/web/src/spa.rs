//! Entry document and SPA fallback handlers.

use std::sync::Arc;

use axum::{extract::State, http::Uri, response::Response};

use crate::assets::{SiteRoot, not_found};

/// `GET /`: the application entry document.
pub async fn entry_handler(State(site): State<Arc<SiteRoot>>) -> Response {
    site.entry_response().await
}

/// Requests no static file matched. Paths that name a file (the last
/// segment has an extension) are genuinely missing; anything else is a
/// client-side route and gets the entry document.
pub async fn spa_fallback(State(site): State<Arc<SiteRoot>>, uri: Uri) -> Response {
    if names_a_file(uri.path()) {
        return not_found();
    }
    site.entry_response().await
}

fn names_a_file(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_like_paths() {
        assert!(names_a_file("/missing.js"));
        assert!(names_a_file("/static/css/app.css"));
        assert!(!names_a_file("/rooms/general"));
        assert!(!names_a_file("/v1.2/settings"));
        assert!(!names_a_file("/"));
    }
}
