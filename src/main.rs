use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use flightboard::flights_client::{FlightDataClient, FlightDataConfig};
use flightboard::web::start_web_server;

#[derive(Debug, Parser)]
#[command(name = "flightboard", about = "HTTP API over the flight board open dataset")]
struct Cli {
    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0")]
    interface: String,

    /// Port to listen on
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

/// Upstream settings come from the environment (with `.env` support) so a
/// deployment can point at a mirror without a rebuild.
fn upstream_config_from_env() -> Result<FlightDataConfig> {
    let mut config = FlightDataConfig::default();

    if let Ok(base_url) = env::var("FLIGHTBOARD_BASE_URL") {
        config.base_url = base_url;
    }
    if let Ok(resource_id) = env::var("FLIGHTBOARD_RESOURCE_ID") {
        config.resource_id = resource_id;
    }
    if let Ok(limit) = env::var("FLIGHTBOARD_LIMIT") {
        config.limit = limit
            .parse()
            .context("FLIGHTBOARD_LIMIT must be a positive integer")?;
    }
    if let Ok(secs) = env::var("FLIGHTBOARD_UPSTREAM_TIMEOUT_SECS") {
        let secs: u64 = secs
            .parse()
            .context("FLIGHTBOARD_UPSTREAM_TIMEOUT_SECS must be a number of seconds")?;
        config.timeout = Some(Duration::from_secs(secs));
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = upstream_config_from_env()?;
    let client = FlightDataClient::new(config);

    start_web_server(cli.interface, cli.port, client).await
}
