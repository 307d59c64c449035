//! Observability lab service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ instrumentation ─▶ handler ─┐
//!                                   (span, timer)               │
//!                                                               ▼
//!     Client Response              completion step       /health /hello
//!     ◀────────────── request id ◀─ counter, histogram ◀─ /slow  /error
//!                                   log line, trace id      │
//!                                                           ▼
//!                                                    memo table (LRU)
//!
//!     Telemetry ──▶ OTLP collector (spans, metrics)
//!               ──▶ stdout (JSON log lines)
//!               ──▶ Prometheus scrape (optional)
//! ```
//!
//! # Usage
//!
//! ```bash
//! observability-lab --config lab.toml --bind 127.0.0.1:8000
//! ```
//!
//! Environment variables override the config file:
//! - `OTEL_SERVICE_NAME`: service name
//! - `DEPLOY_ENV`: deployment environment tag
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP collector endpoint
//! - `LAB_BIND_ADDRESS`: listener address
//! - `RUST_LOG`: log filter

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use observability_lab::config::{resolve_config, validation::validate_config, ConfigError};
use observability_lab::lifecycle::{spawn_signal_listener, Shutdown};
use observability_lab::observability::{logging, metrics};
use observability_lab::{HttpServer, Telemetry};

/// Observability lab: an HTTP service that simulates latency, caching and
/// failures while emitting traces, metrics and structured logs.
#[derive(Parser, Debug)]
#[command(name = "observability-lab", version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "LAB_CONFIG")]
    config: Option<PathBuf>,

    /// Listener address, overriding config and LAB_BIND_ADDRESS
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    let telemetry = Arc::new(Telemetry::from_config(&config)?);
    logging::init_logging(&config.observability, telemetry.tracer())?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        service = %config.service.name,
        env = %config.service.environment,
        otlp_enabled = config.telemetry.otlp_enabled,
        otlp_endpoint = %config.telemetry.otlp_endpoint,
        cache_capacity = config.compute.cache_capacity,
        compute_delay_ms = config.compute.delay_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start Prometheus exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config, telemetry.clone());
    server.run(listener, shutdown.signal()).await?;

    // Provider shutdown blocks on the exporters' final flush.
    tokio::task::spawn_blocking(move || telemetry.shutdown()).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
