//! Observability lab service library.
//!
//! A small HTTP service that simulates latency, caching and random
//! failures, and emits traces, metrics and one structured log line per
//! request.

pub mod client;
pub mod compute;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::LabConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::Telemetry;
