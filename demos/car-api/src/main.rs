//! Car catalogue server.
//!
//! Serves `/api/v1/car` and `/api/v1/car/{id}`, plus `/openapi.json` and
//! `/docs.json` for the route documentation.

use anyhow::{Context, Result};
use car_api::transport;
use clap::Parser;
use gantry_gateway::{Gateway, GatewayConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "car-api")]
#[command(about = "Car catalogue served through the Gantry gateway", long_about = None)]
#[command(version)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// YAML gateway configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API prefix, overrides the configuration file
    #[arg(long)]
    prefix: Option<String>,

    /// Version used for URIs without a version segment
    #[arg(long)]
    default_version: Option<u32>,
}

fn load_config(cli: &Cli) -> Result<GatewayConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_yaml::from_str(&text)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?
        }
        None => GatewayConfig::default(),
    };

    if let Some(prefix) = &cli.prefix {
        config.api_prefix = prefix.trim_end_matches('/').to_string();
    }
    if let Some(version) = cli.default_version {
        config.default_version = version;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let registry = car_api::registry().context("Invalid route definitions")?;
    let gateway = Gateway::builder()
        .config(config)
        .registry(registry)
        .build()
        .context("Invalid API prefix")?;

    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("Failed to bind {}", cli.listen))?;
    info!(
        "Car API listening on {} under {}",
        cli.listen,
        gateway.config().api_prefix
    );

    axum::serve(listener, transport::app(Arc::new(gateway))).await?;
    Ok(())
}
