//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request (http::middleware):
//!     → telemetry.rs (OTLP counter + histogram, request log line)
//!     → metrics.rs (Prometheus mirror, optional)
//!     → tracing.rs (trace id of the active span)
//!
//! Consumers:
//!     → stdout (JSON log lines)
//!     → OTLP collector (spans, metrics)
//!     → Prometheus scrape (optional)
//! ```
//!
//! # Design Decisions
//! - Telemetry handles are an explicit context, not looked up globally
//! - Telemetry failures never reach the client

pub mod logging;
pub mod metrics;
pub mod telemetry;
pub mod tracing;

pub use telemetry::{RequestRecord, Telemetry, TelemetryError};
