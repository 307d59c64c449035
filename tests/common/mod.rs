//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use observability_lab::{HttpServer, LabConfig, Shutdown, Telemetry};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::TracerProvider;
use serde_json::Value;
use tower::ServiceExt;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;

/// Config with OTLP export off and an ephemeral port.
pub fn test_config() -> LabConfig {
    let mut config = LabConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.telemetry.otlp_enabled = false;
    config.service.name = "lab-test".into();
    config.service.environment = "test".into();
    config
}

/// Server wired to in-process telemetry.
pub fn test_server(config: LabConfig) -> HttpServer {
    let telemetry = Arc::new(Telemetry::local(
        &config.service.name,
        &config.service.environment,
    ));
    HttpServer::new(config, telemetry)
}

/// Send a GET through the router and decode the JSON body.
pub async fn get(router: Router, uri: &str) -> (StatusCode, Value, Duration) {
    let start = Instant::now();
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let elapsed = start.elapsed();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json, elapsed)
}

/// Bind `config` on an ephemeral port and serve in the background.
pub async fn start_server(config: LabConfig) -> (SocketAddr, Shutdown) {
    let listener = tokio::net::TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = test_server(config);
    let signal = shutdown.signal();
    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    (addr, shutdown)
}

/// In-memory log sink for asserting on emitted JSON lines.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Every captured line parsed as JSON.
    pub fn lines(&self) -> Vec<Value> {
        let buf = self.buf.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect()
    }

    /// Captured lines whose `event` field is `request`.
    pub fn request_lines(&self) -> Vec<Value> {
        self.lines()
            .into_iter()
            .filter(|l| l["event"] == "request")
            .collect()
    }
}

pub struct CapturedWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buf: self.buf.clone(),
        }
    }
}

/// Install a thread-local JSON subscriber writing into the returned sink.
///
/// Use with a current-thread runtime so every task logs on this thread.
pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_max_level(tracing::Level::INFO)
        .with_writer(logs.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (guard, logs)
}

/// Log and span sinks for a subscriber bridged into OpenTelemetry.
pub struct OtelCapture {
    pub logs: CapturedLogs,
    pub spans: InMemorySpanExporter,
    _provider: TracerProvider,
}

/// Like [`capture_logs`], with a `tracing-opentelemetry` layer exporting
/// finished spans into memory.
pub fn capture_logs_with_otel() -> (tracing::subscriber::DefaultGuard, OtelCapture) {
    let logs = CapturedLogs::default();
    let spans = InMemorySpanExporter::default();
    let provider = TracerProvider::builder()
        .with_simple_exporter(spans.clone())
        .build();

    let subscriber = tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_writer(logs.clone()),
        )
        .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("lab-test")));
    let guard = tracing::subscriber::set_default(subscriber);

    (
        guard,
        OtelCapture {
            logs,
            spans,
            _provider: provider,
        },
    )
}
