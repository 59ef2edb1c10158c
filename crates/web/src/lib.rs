//! Static site plugin: the client application's entry document, its static
//! assets, and the catch-all for unmatched requests.

pub mod assets;
pub mod error;
pub mod plugin;
pub mod spa;

pub use {
    assets::SiteRoot,
    error::{Error, Result},
    plugin::StaticSitePlugin,
};
