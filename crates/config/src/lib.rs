//! Configuration loading and env substitution.
//!
//! Config files: `parley.toml`, `parley.yaml`, or `parley.json`
//! Searched in `./` then `~/.config/parley/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values, and
//! `PARLEY_*` environment overrides applied after the file is parsed.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, discover_and_load, load_config, resolve, to_toml_string,
    },
    schema::{ParleyConfig, ServerConfig, StoreConfig, WebConfig},
};
