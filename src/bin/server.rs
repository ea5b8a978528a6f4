//! HTTP server for photowrapped.
//!
//! ```bash
//! photowrapped-server                      # host/port from the config file
//! photowrapped-server --port 8080
//! PHOTOWRAPPED_LOG=debug photowrapped-server
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use photowrapped::config::Config;
use photowrapped::db::Database;
use photowrapped::logging::{self, LogTarget};
use photowrapped::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(name = "photowrapped-server", version, about = "Serve the photowrapped HTTP API")]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/photowrapped/config.toml)
    #[arg(long, env = "PHOTOWRAPPED_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,

    /// Directory for log files when journald is unavailable
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init(LogTarget::Service {
        log_dir: args.log_dir.clone(),
    })?;
    info!("Starting photowrapped server v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let db = Database::open(&config.db_path)?;
    db.initialize().context("initializing database schema")?;
    info!("Database opened at {:?}", config.db_path);

    let address = config.bind_address();
    let state = AppState::new(db, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;
    info!("photowrapped listening on http://{}", address);
    info!("Health check: http://{}/api/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
