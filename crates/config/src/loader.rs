use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::ParleyConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["parley.toml", "parley.yaml", "parley.yml", "parley.json"];

pub const ENV_BIND: &str = "PARLEY_BIND";
pub const ENV_PORT: &str = "PARLEY_PORT";
pub const ENV_STORE_URL: &str = "PARLEY_STORE_URL";
pub const ENV_ASSETS_DIR: &str = "PARLEY_ASSETS_DIR";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<ParleyConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./parley.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/parley/parley.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `ParleyConfig::default()` when nothing is found or the file
/// found cannot be parsed.
pub fn discover_and_load() -> ParleyConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return ParleyConfig::default();
    };
    debug!(path = %path.display(), "loading config");
    load_config(&path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
        ParleyConfig::default()
    })
}

/// Load `explicit` when given (errors are fatal), otherwise discover.
/// `PARLEY_*` overrides are applied on top in both cases.
pub fn resolve(explicit: Option<&Path>) -> Result<ParleyConfig> {
    let mut config = match explicit {
        Some(path) => load_config(path)?,
        None => discover_and_load(),
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/parley/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "parley").map(|d| d.config_dir().to_path_buf())
}

/// Apply `PARLEY_*` environment overrides.
pub fn apply_env_overrides(config: &mut ParleyConfig) -> Result<()> {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

pub(crate) fn apply_env_overrides_with(
    config: &mut ParleyConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(bind) = lookup(ENV_BIND) {
        config.server.bind = bind;
    }
    if let Some(port) = lookup(ENV_PORT) {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|_| Error::invalid_env(ENV_PORT, &port))?;
    }
    if let Some(url) = lookup(ENV_STORE_URL) {
        config.store.url = url;
    }
    if let Some(dir) = lookup(ENV_ASSETS_DIR) {
        config.web.assets_dir = PathBuf::from(dir);
    }
    Ok(())
}

/// Render the effective configuration as TOML.
pub fn to_toml_string(config: &ParleyConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

fn parse_config(raw: &str, path: &Path) -> Result<ParleyConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}
