mod config_commands;
mod messages_commands;

use std::path::PathBuf;

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    parley_chat::ChatPlugin,
    parley_config::ParleyConfig,
    parley_gateway::{HostServer, ServerPlugin},
    parley_web::StaticSitePlugin,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "parley", about = "Parley, a realtime chat relay", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Message store connection string (overrides config value).
    #[arg(long, global = true)]
    store_url: Option<String>,
    /// Built client application to serve (overrides config value).
    #[arg(long, global = true)]
    assets_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server (default when no subcommand is provided).
    Serve,
    /// Configuration inspection.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
    /// Stored history inspection.
    Messages {
        #[command(subcommand)]
        action: messages_commands::MessagesAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// File (or discovered file), then `PARLEY_*` env, then command-line flags.
fn effective_config(cli: &Cli) -> anyhow::Result<ParleyConfig> {
    let mut config = parley_config::resolve(cli.config.as_deref()).context("loading config")?;
    apply_cli_overrides(&mut config, cli);
    Ok(config)
}

fn apply_cli_overrides(config: &mut ParleyConfig, cli: &Cli) {
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(url) = &cli.store_url {
        config.store.url = url.clone();
    }
    if let Some(dir) = &cli.assets_dir {
        config.web.assets_dir = dir.clone();
    }
}

async fn serve(config: ParleyConfig) -> anyhow::Result<()> {
    // The static site answers whatever the chat plugin does not.
    let plugins: Vec<Box<dyn ServerPlugin>> = vec![
        Box::new(ChatPlugin::new(config.store.url.clone())),
        Box::new(StaticSitePlugin::new(config.web.assets_dir.clone())),
    ];
    let server = HostServer::new(config, plugins).await?;
    server.listen().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = effective_config(&cli)?;

    match cli.command {
        None | Some(Commands::Serve) => {
            info!(version = env!("CARGO_PKG_VERSION"), "parley starting");
            serve(config).await
        },
        Some(Commands::Config { action }) => config_commands::handle_config(action, &config),
        Some(Commands::Messages { action }) => {
            messages_commands::handle_messages(action, &config).await
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["parley"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "parley",
            "serve",
            "--port",
            "4000",
            "--bind",
            "0.0.0.0",
            "--store-url",
            "sqlite::memory:",
            "--assets-dir",
            "public",
        ])
        .unwrap();
        let mut config = ParleyConfig::default();
        apply_cli_overrides(&mut config, &cli);

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.store.url, "sqlite::memory:");
        assert_eq!(config.web.assets_dir, PathBuf::from("public"));
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let cli = Cli::try_parse_from(["parley", "config", "show"]).unwrap();
        let mut config = ParleyConfig::default();
        config.server.port = 9999;
        apply_cli_overrides(&mut config, &cli);
        assert_eq!(config.server.port, 9999);
        assert!(matches!(cli.command, Some(Commands::Config { .. })));
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.toml");
        std::fs::write(&path, "[store]\nurl = \"sqlite:chat.db\"\n").unwrap();

        let cli = Cli::try_parse_from([
            "parley",
            "messages",
            "list",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "5000",
        ])
        .unwrap();
        let config = effective_config(&cli).unwrap();
        assert_eq!(config.store.url, "sqlite:chat.db");
        assert_eq!(config.server.port, 5000);
    }
}
