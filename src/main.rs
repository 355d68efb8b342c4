//! Academy Gate
//!
//! Serves the access decisions behind the academy's gated pages and a
//! video proxy that rewrites HLS playlists so every segment, key and
//! variant is fetched through it.

mod config;
mod config_file;
mod error;
mod http;
mod metrics;
mod session;
mod state;

use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::config_file::ConfigFile;
use crate::error::Result;
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "academy-gate";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Override the configured bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured port
    #[arg(short, long)]
    port: Option<u16>,

    /// Write a default configuration file to the config path and exit
    #[arg(long)]
    generate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.generate_config {
        config_file::generate_default_config(&args.config)
            .map_err(|e| error::ServerError::Config(e.to_string()))?;
        println!("Wrote default configuration to {}", args.config);
        return Ok(());
    }

    // Logging depends on the config, so a load failure is reported after
    // the subscriber is up.
    let (mut config, load_error) = load_config(&args.config);
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    init_logging(&config);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Some(e) = load_error {
        tracing::warn!(
            "Failed to load config file {}: {}. Using defaults.",
            args.config,
            e
        );
    }
    config.validate()?;
    tracing::info!("Configuration loaded: {:?}", config);
    if config.guard.session_url.is_none() {
        tracing::warn!("No session service configured; every guarded page redirects to sign-in");
    }

    // Create application state
    let state = Arc::new(AppState::new(config.clone())?);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
    tracing::info!("Starting HTTP server on {}", listener.local_addr()?);
    tracing::info!("Video proxy mounted at {}", config.proxy.endpoint);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Load the config file if it exists, falling back to defaults.
fn load_config(path: &str) -> (ServerConfig, Option<String>) {
    if !Path::new(path).exists() {
        return (ServerConfig::default(), None);
    }
    match ConfigFile::from_file(path) {
        Ok(cf) => (cf.into_server_config(), None),
        Err(e) => (ServerConfig::default(), Some(e.to_string())),
    }
}

/// Initialize logging with tracing
fn init_logging(config: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.log_level;
        format!(
            "academy_gate={level},academy_gate_lib={level},tower_http={level}",
            level = level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
