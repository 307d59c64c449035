//! Telemetry context shared by the request path.
//!
//! [`Telemetry`] is built once at startup and injected into the
//! instrumentation middleware. It owns the tracer and meter providers for
//! the process lifetime, along with the request instruments.

use std::time::Duration;

use opentelemetry::metrics::{Counter, Histogram, MeterProvider as _, MetricsError};
use opentelemetry::trace::{TraceError, TraceId, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use opentelemetry_sdk::Resource;
use thiserror::Error;

use crate::config::LabConfig;
use crate::observability::metrics;
use crate::observability::tracing::{
    format_trace_id, local_tracer_provider, otlp_tracer_provider,
};

/// Instrumentation scope name for spans and metrics.
pub const INSTRUMENTATION_SCOPE: &str = "observability-lab";

/// Errors raised while building or feeding telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build trace exporter: {0}")]
    Trace(#[from] TraceError),

    #[error("failed to build metrics exporter: {0}")]
    Metrics(#[from] MetricsError),

    #[error("latency of {0:?} does not fit in whole milliseconds")]
    LatencyOverflow(Duration),
}

/// What the middleware observed about one completed request.
#[derive(Debug, Clone)]
pub struct RequestRecord<'a> {
    pub path: &'a str,
    pub method: &'a str,
    pub status: u16,
    pub elapsed: Duration,
    pub trace_id: TraceId,
    pub request_id: Option<&'a str>,
}

/// Process-wide telemetry handles.
pub struct Telemetry {
    service: String,
    environment: String,
    tracer_provider: TracerProvider,
    meter_provider: SdkMeterProvider,
    requests_total: Counter<u64>,
    request_latency: Histogram<u64>,
}

impl Telemetry {
    /// Build providers from configuration, exporting over OTLP when enabled.
    ///
    /// Must be called from within a Tokio runtime when OTLP is enabled.
    pub fn from_config(config: &LabConfig) -> Result<Self, TelemetryError> {
        let resource = service_resource(&config.service.name, &config.service.environment);

        let (tracer_provider, meter_provider) = if config.telemetry.otlp_enabled {
            // Export failures surface here from background tasks.
            if let Err(e) = opentelemetry::global::set_error_handler(|err| {
                tracing::debug!(error = %err, "OpenTelemetry export error");
            }) {
                tracing::debug!(error = %e, "Keeping default OpenTelemetry error handler");
            }

            let endpoint = config.telemetry.otlp_endpoint.as_str();
            let tracer_provider = otlp_tracer_provider(endpoint, resource.clone())?;

            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint);
            let meter_provider = opentelemetry_otlp::new_pipeline()
                .metrics(opentelemetry_sdk::runtime::Tokio)
                .with_exporter(exporter)
                .with_resource(resource)
                .with_period(Duration::from_millis(
                    config.telemetry.metric_export_interval_ms,
                ))
                .build()?;

            (tracer_provider, meter_provider)
        } else {
            (local_tracer_provider(resource.clone()), local_meter_provider(resource))
        };

        Ok(Self::with_providers(
            &config.service.name,
            &config.service.environment,
            tracer_provider,
            meter_provider,
        ))
    }

    /// Telemetry that records in-process but never exports.
    pub fn local(service: &str, environment: &str) -> Self {
        let resource = service_resource(service, environment);
        Self::with_providers(
            service,
            environment,
            local_tracer_provider(resource.clone()),
            local_meter_provider(resource),
        )
    }

    fn with_providers(
        service: &str,
        environment: &str,
        tracer_provider: TracerProvider,
        meter_provider: SdkMeterProvider,
    ) -> Self {
        let meter = meter_provider.meter(INSTRUMENTATION_SCOPE);

        let requests_total = meter
            .u64_counter("requests_total")
            .with_description("Completed HTTP requests")
            .with_unit("1")
            .init();
        let request_latency = meter
            .u64_histogram("request_latency_ms")
            .with_description("HTTP request latency")
            .with_unit("ms")
            .init();

        Self {
            service: service.to_string(),
            environment: environment.to_string(),
            tracer_provider,
            meter_provider,
            requests_total,
            request_latency,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Tracer for the `tracing-opentelemetry` layer.
    pub fn tracer(&self) -> Tracer {
        self.tracer_provider.tracer(INSTRUMENTATION_SCOPE)
    }

    /// Count the request, record its latency and emit the request log line.
    pub fn record_request(&self, record: &RequestRecord<'_>) -> Result<(), TelemetryError> {
        let latency_ms = u64::try_from(record.elapsed.as_millis())
            .map_err(|_| TelemetryError::LatencyOverflow(record.elapsed))?;

        self.requests_total.add(
            1,
            &[
                KeyValue::new("path", record.path.to_string()),
                KeyValue::new("method", record.method.to_string()),
                KeyValue::new("status", record.status.to_string()),
            ],
        );
        self.request_latency.record(
            latency_ms,
            &[
                KeyValue::new("path", record.path.to_string()),
                KeyValue::new("method", record.method.to_string()),
            ],
        );
        metrics::record_request(record.path, record.method, record.status, latency_ms);

        tracing::info!(
            target: "request",
            event = "request",
            service = %self.service,
            env = %self.environment,
            path = record.path,
            method = record.method,
            status = record.status,
            latency_ms,
            trace_id = %format_trace_id(record.trace_id),
            request_id = record.request_id,
        );

        Ok(())
    }

    /// Flush and stop both providers. Errors are logged, not returned.
    pub fn shutdown(&self) {
        if let Err(e) = self.meter_provider.shutdown() {
            tracing::warn!(error = %e, "Meter provider shutdown failed");
        }
        if let Err(e) = self.tracer_provider.shutdown() {
            tracing::warn!(error = %e, "Tracer provider shutdown failed");
        }
    }
}

fn service_resource(service: &str, environment: &str) -> Resource {
    Resource::new(vec![
        KeyValue::new("service.name", service.to_string()),
        KeyValue::new("deployment.environment", environment.to_string()),
    ])
}

fn local_meter_provider(resource: Resource) -> SdkMeterProvider {
    SdkMeterProvider::builder()
        .with_reader(ManualReader::builder().build())
        .with_resource(resource)
        .build()
}
