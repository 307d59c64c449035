//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the OpenTelemetry tracer provider (OTLP batch export or local)
//! - Read the trace id of the active `tracing` span
//! - Render trace ids for log records
//!
//! # Design Decisions
//! - `tracing` spans are bridged to OpenTelemetry by `tracing-opentelemetry`
//! - With OTLP disabled spans are still created, so trace ids keep appearing
//!   in logs, but nothing is exported

use opentelemetry::trace::{TraceContextExt, TraceError, TraceId};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Config, TracerProvider};
use opentelemetry_sdk::Resource;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Build a tracer provider exporting batches to `endpoint` over OTLP/gRPC.
///
/// Must be called from within a Tokio runtime.
pub fn otlp_tracer_provider(
    endpoint: &str,
    resource: Resource,
) -> Result<TracerProvider, TraceError> {
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(Config::default().with_resource(resource))
        .install_batch(opentelemetry_sdk::runtime::Tokio)
}

/// Build a tracer provider that creates spans but never exports them.
pub fn local_tracer_provider(resource: Resource) -> TracerProvider {
    TracerProvider::builder()
        .with_config(Config::default().with_resource(resource))
        .build()
}

/// Trace id of the currently active span, or [`TraceId::INVALID`] when no
/// span (or no OpenTelemetry layer) is active.
pub fn current_trace_id() -> TraceId {
    let context = tracing::Span::current().context();
    let span = context.span();
    let span_context = span.span_context();
    if span_context.is_valid() {
        span_context.trace_id()
    } else {
        TraceId::INVALID
    }
}

/// Render a trace id as `0x`-prefixed hex without padding (`0x0` if absent).
pub fn format_trace_id(trace_id: TraceId) -> String {
    format!("{:#x}", u128::from_be_bytes(trace_id.to_bytes()))
}
