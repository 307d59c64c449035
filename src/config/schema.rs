//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the lab
//! service. All types derive Serde traits for deserialization from config
//! files, and every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};

/// Root configuration for the lab service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LabConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Service identity stamped on logs and telemetry.
    pub service: ServiceConfig,

    /// OTLP collector settings.
    pub telemetry: TelemetryConfig,

    /// Logging and local metrics settings.
    pub observability: ObservabilityConfig,

    /// Memoized compute settings.
    pub compute: ComputeConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name (`service.name` resource attribute).
    pub name: String,

    /// Deployment environment tag (`deployment.environment`).
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "observability-lab".to_string(),
            environment: "dev".to_string(),
        }
    }
}

/// OpenTelemetry export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Export spans and metrics over OTLP. When disabled, spans and metrics
    /// are still recorded in-process but never leave it.
    pub otlp_enabled: bool,

    /// OTLP gRPC collector endpoint.
    pub otlp_endpoint: String,

    /// Interval between periodic metric exports in milliseconds.
    pub metric_export_interval_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_enabled: true,
            otlp_endpoint: "http://agent:4317".to_string(),
            metric_export_interval_ms: 5000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable output for local development.
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Prometheus scrape endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Memoized compute configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ComputeConfig {
    /// Artificial delay paid by every uncached computation, in milliseconds.
    pub delay_ms: u64,

    /// Maximum number of memoized results.
    pub cache_capacity: usize,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            delay_ms: 800,
            cache_capacity: 256,
        }
    }
}
