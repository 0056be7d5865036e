//! Thematic map viewer service.
//!
//! Renders map configurations resolved from bootstrap parameters into
//! headless scenes and serves them as JSON.

use anyhow::Result;
use clap::Parser;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use map_viewer::{router, AppState};
use storage::DEFAULT_GIST_API;

#[derive(Parser, Debug)]
#[command(name = "map-viewer")]
#[command(about = "Thematic map viewer service")]
struct Args {
    /// Listen address
    #[arg(short, long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Log level or filter directive
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Base URL of the gist API
    #[arg(long, env = "GIST_API_URL", default_value = DEFAULT_GIST_API)]
    gist_api: String,

    /// Timeout for outbound requests, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    /// Hosts data may be fetched from (comma-separated; empty allows any)
    #[arg(long, env = "ALLOWED_HOSTS", value_delimiter = ',')]
    allowed_hosts: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    info!("Prometheus metrics exporter initialized");

    let state = AppState::new(
        &args.gist_api,
        Duration::from_secs(args.request_timeout_secs),
        &args.allowed_hosts,
    )?
    .with_prometheus(prometheus_handle);
    let app = router(Arc::new(state));

    let addr: SocketAddr = args.listen.parse()?;
    info!(
        address = %addr,
        gist_api = %args.gist_api,
        allowed_hosts = ?args.allowed_hosts,
        "Starting map viewer"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
