//! HTTP middleware.

pub mod instrumentation;

pub use instrumentation::{instrument_request, RequestObserver, SharedObserver};
