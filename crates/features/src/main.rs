//! AuthorMatch Feature Service
//!
//! Batch driver:
//! 1. Loads configuration
//! 2. Populates the entity catalog through the artifact cache
//! 3. Runs the requested label-file passes and neighbor search
//! 4. Writes feature and neighbor CSV files

use anyhow::Context;
use authormatch_common::config::{AppConfig, ObservabilityConfig};
use authormatch_common::metrics::{register_metrics, METRICS_PREFIX, STAGE_BUCKETS};
use authormatch_common::VERSION;
use authormatch_features::{execute, Command};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::new(&config.log_level);

    if config.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_stage_duration_seconds", METRICS_PREFIX)),
            STAGE_BUCKETS,
        )?
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!(%addr, "Prometheus exporter listening");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.observability);

    if config.observability.metrics_port != 0 {
        init_metrics(config.observability.metrics_port)?;
    }
    register_metrics();

    let command = Command::parse(std::env::args().skip(1))?;
    info!(
        version = VERSION,
        service = %config.observability.service_name,
        ?command,
        "Starting AuthorMatch feature service"
    );

    execute(config, command).await.map_err(|e| {
        tracing::error!(error = %e, "Batch failed");
        e
    })?;

    info!("Batch complete");
    Ok(())
}
