//! Request instrumentation middleware.
//!
//! Wraps every request in a server span, and once the handler has produced
//! a response runs the completion step exactly once: count, time and log
//! the request. Whatever happens in that step, the handler's response is
//! returned untouched.
//!
//! The handler and the completion step run on a detached task. A client
//! that disconnects drops only the wait for that task, so a started request
//! still finishes, still fills the memo table and is still recorded.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{field, Instrument, Span};

use crate::http::request::RequestIdExt;
use crate::http::response::AppError;
use crate::observability::tracing::current_trace_id;
use crate::observability::{RequestRecord, Telemetry, TelemetryError};

/// Receives the completion record of every request.
pub trait RequestObserver: Send + Sync + 'static {
    fn on_request_complete(&self, record: &RequestRecord<'_>) -> Result<(), TelemetryError>;
}

impl RequestObserver for Telemetry {
    fn on_request_complete(&self, record: &RequestRecord<'_>) -> Result<(), TelemetryError> {
        self.record_request(record)
    }
}

/// Shared observer handle used as middleware state.
pub type SharedObserver = Arc<dyn RequestObserver>;

/// Axum middleware recording telemetry for each request.
pub async fn instrument_request(
    State(observer): State<SharedObserver>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = request.request_id().map(str::to_owned);

    let span = tracing::info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.status_code = field::Empty,
        otel.kind = "server",
    );

    let task = tokio::spawn(async move {
        let handler = tokio::spawn(next.run(request).instrument(span.clone()));
        let response = match handler.await {
            Ok(response) => response,
            Err(e) => {
                span.in_scope(|| {
                    tracing::error!(error = %e, path = %path, "Request handler failed");
                });
                AppError::Internal("request handler failed".into()).into_response()
            }
        };

        complete(
            observer.as_ref(),
            &span,
            Completion {
                method: &method,
                path: &path,
                status: response.status(),
                start,
                request_id: request_id.as_deref(),
            },
        );

        response
    });

    match task.await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Request task aborted");
            AppError::Internal("request aborted".into()).into_response()
        }
    }
}

struct Completion<'a> {
    method: &'a str,
    path: &'a str,
    status: StatusCode,
    start: Instant,
    request_id: Option<&'a str>,
}

/// Completion step. Errors and panics stop here.
fn complete(observer: &dyn RequestObserver, span: &Span, done: Completion<'_>) {
    let status = done.status.as_u16();
    span.record("http.status_code", status);

    let outcome = span.in_scope(|| {
        panic::catch_unwind(AssertUnwindSafe(|| {
            let record = RequestRecord {
                path: done.path,
                method: done.method,
                status,
                elapsed: done.start.elapsed(),
                trace_id: current_trace_id(),
                request_id: done.request_id,
            };
            observer.on_request_complete(&record)
        }))
    });

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::debug!(error = %e, path = done.path, "Dropped request telemetry");
        }
        Err(_) => {
            tracing::debug!(path = done.path, "Request telemetry panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    #[derive(Default)]
    struct Recording {
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, String, u16)>>,
    }

    impl RequestObserver for Recording {
        fn on_request_complete(&self, record: &RequestRecord<'_>) -> Result<(), TelemetryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push((
                record.path.to_string(),
                record.method.to_string(),
                record.status,
            ));
            Ok(())
        }
    }

    struct Failing;

    impl RequestObserver for Failing {
        fn on_request_complete(&self, _: &RequestRecord<'_>) -> Result<(), TelemetryError> {
            Err(TelemetryError::LatencyOverflow(Duration::MAX))
        }
    }

    struct Panicking;

    impl RequestObserver for Panicking {
        fn on_request_complete(&self, _: &RequestRecord<'_>) -> Result<(), TelemetryError> {
            panic!("exporter exploded");
        }
    }

    async fn explode() -> &'static str {
        panic!("handler bug")
    }

    fn app(observer: SharedObserver) -> Router {
        Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route(
                "/teapot",
                get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }),
            )
            .route("/explode", get(explode))
            .route(
                "/sleepy",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    "rested"
                }),
            )
            .layer(middleware::from_fn_with_state(observer, instrument_request))
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_completion_runs_once_per_request() {
        let recording = Arc::new(Recording::default());
        let router = app(recording.clone());

        call(router.clone(), "/ok").await;
        call(router.clone(), "/teapot").await;
        call(router, "/missing").await;

        assert_eq!(recording.calls.load(Ordering::SeqCst), 3);
        let seen = recording.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                ("/ok".to_string(), "GET".to_string(), 200),
                ("/teapot".to_string(), "GET".to_string(), 418),
                ("/missing".to_string(), "GET".to_string(), 404),
            ]
        );
    }

    #[tokio::test]
    async fn test_telemetry_error_does_not_alter_response() {
        let (status, body) = call(app(Arc::new(Failing)), "/teapot").await;
        assert_eq!(status, StatusCode::IM_A_TEAPOT);
        assert_eq!(body, "short and stout");
    }

    #[tokio::test]
    async fn test_telemetry_panic_does_not_alter_response() {
        let (status, body) = call(app(Arc::new(Panicking)), "/ok").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "fine");
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_recorded_500() {
        let recording = Arc::new(Recording::default());

        let (status, _) = call(app(recording.clone()), "/explode").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let seen = recording.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![("/explode".to_string(), "GET".to_string(), 500)]);
    }

    #[tokio::test]
    async fn test_dropped_request_still_completes() {
        let recording = Arc::new(Recording::default());
        let request = axum::http::Request::builder()
            .uri("/sleepy")
            .body(Body::empty())
            .unwrap();

        let cut_short =
            tokio::time::timeout(Duration::from_millis(10), app(recording.clone()).oneshot(request))
                .await;
        assert!(cut_short.is_err());
        assert_eq!(recording.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(recording.calls.load(Ordering::SeqCst), 1);
        let seen = recording.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![("/sleepy".to_string(), "GET".to_string(), 200)]);
    }
}
