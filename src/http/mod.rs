//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (assign / propagate request ID)
//!     → middleware/ (span, timing, completion telemetry)
//!     → handlers.rs (/health, /hello, /slow, /error)
//!     → response.rs (JSON error bodies)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::AppState;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::AppError;
pub use server::HttpServer;
