//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, instrumentation)
//! - Bind server to listener
//! - Serve until the shutdown signal fires

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::compute::MemoCompute;
use crate::config::LabConfig;
use crate::http::handlers::{self, AppState};
use crate::http::middleware::{instrument_request, SharedObserver};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::ShutdownSignal;
use crate::observability::Telemetry;

/// HTTP server for the lab service.
pub struct HttpServer {
    router: Router,
    config: LabConfig,
    compute: Arc<MemoCompute>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and telemetry.
    pub fn new(config: LabConfig, telemetry: Arc<Telemetry>) -> Self {
        Self::with_observer(config, telemetry)
    }

    /// Create a server reporting request completions to `observer`.
    pub fn with_observer(config: LabConfig, observer: SharedObserver) -> Self {
        let compute = Arc::new(MemoCompute::from_config(&config.compute));
        let state = AppState {
            service: Arc::new(config.service.clone()),
            compute: compute.clone(),
        };

        let router = Self::build_router(state, observer);
        Self {
            router,
            config,
            compute,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outermost-last: the request ID is assigned before the
    /// instrumentation middleware sees the request.
    pub fn build_router(state: AppState, observer: SharedObserver) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/hello", get(handlers::hello))
            .route("/slow", get(handlers::slow))
            .route("/error", get(handlers::sometimes_errors))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(middleware::from_fn_with_state(observer, instrument_request))
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// A clone of the fully layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The memo table shared by `/slow` requests.
    pub fn compute(&self) -> &Arc<MemoCompute> {
        &self.compute
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.service.name,
            env = %self.config.service.environment,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
