//! Files served from the client application's build output.

use std::path::{Path, PathBuf};

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::error::{Error, Result};

pub const ENTRY_DOCUMENT: &str = "index.html";

/// Root directory of the built single-page application.
#[derive(Debug, Clone)]
pub struct SiteRoot {
    root: PathBuf,
}

impl SiteRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self) -> PathBuf {
        self.root.join(ENTRY_DOCUMENT)
    }

    /// Verify the root and its entry document exist.
    pub fn check(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(Error::MissingRoot {
                path: self.root.clone(),
            });
        }
        let entry = self.entry_path();
        if !entry.is_file() {
            return Err(Error::MissingEntry { path: entry });
        }
        Ok(())
    }

    /// The entry document, always revalidated by the browser so a new
    /// client build is picked up immediately. `404` when it is missing.
    pub async fn entry_response(&self) -> Response {
        match tokio::fs::read(self.entry_path()).await {
            Ok(body) => (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                    (header::CACHE_CONTROL, "no-cache"),
                    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
                ],
                body,
            )
                .into_response(),
            Err(_) => not_found(),
        }
    }
}

pub(crate) fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_reports_what_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let site = SiteRoot::new(dir.path().join("dist"));
        assert!(matches!(site.check(), Err(Error::MissingRoot { .. })));

        std::fs::create_dir(site.path()).unwrap();
        assert!(matches!(site.check(), Err(Error::MissingEntry { .. })));

        std::fs::write(site.entry_path(), "<html></html>").unwrap();
        site.check().unwrap();
    }

    #[tokio::test]
    async fn entry_response_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ENTRY_DOCUMENT), "<html>app</html>").unwrap();
        let resp = SiteRoot::new(dir.path()).entry_response().await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-cache");
    }

    #[tokio::test]
    async fn missing_entry_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let resp = SiteRoot::new(dir.path()).entry_response().await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
