use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSerialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("invalid value for {name}: '{value}'")]
    InvalidEnv { name: String, value: String },
}

impl Error {
    #[must_use]
    pub fn invalid_env(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidEnv {
            name: name.into(),
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
