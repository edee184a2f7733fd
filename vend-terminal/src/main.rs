//! Vend Terminal
//!
//! A line-based terminal front-end for a networked vending machine.

mod app;
mod config;
mod input;
mod render;
mod shutdown;

use app::App;
use clap::Parser;
use config::ConfigLoader;
use shutdown::spawn_signal_handler;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Vend Terminal - vending machine client
#[derive(Parser, Debug)]
#[command(name = "vend-terminal")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./vend-terminal.toml")]
    config: PathBuf,

    /// Override the server URL (e.g., http://127.0.0.1:5000)
    #[arg(short, long, env = "VEND_SERVER_URL")]
    server: Option<Url>,

    /// Override the push channel URL (e.g., ws://127.0.0.1:5000/ws)
    #[arg(long)]
    push_url: Option<Url>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting vend-terminal v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = ConfigLoader::new(&args.config, args.server, args.push_url);
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!(
        base_url = %loaded_config.server.base_url,
        push_url = %loaded_config.server.push_url,
        "Configuration loaded"
    );

    let (shutdown_tx, _shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    spawn_signal_handler(Arc::clone(&shutdown_tx));

    let app = App::start(loaded_config, shutdown_tx)?;
    app.run(input::spawn_stdin_reader()).await;

    tracing::info!("vend-terminal stopped");
    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
///
/// Logs go to stderr; stdout belongs to the renderer.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vend_core=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
