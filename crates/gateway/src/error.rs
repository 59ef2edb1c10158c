#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("only one fallback plugin may be registered, got '{first}' and '{second}'")]
    DuplicateFallback { first: String, second: String },

    #[error("plugin '{plugin}' failed to initialize: {source:#}")]
    PluginInit {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    #[must_use]
    pub fn plugin_init(plugin: impl Into<String>, source: anyhow::Error) -> Self {
        Self::PluginInit {
            plugin: plugin.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
