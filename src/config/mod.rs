//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (OTEL_SERVICE_NAME, DEPLOY_ENV, ...)
//!     → validation.rs (semantic checks)
//!     → LabConfig (validated, immutable)
//!     → shared with all subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at process start and never reloaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve_config, ConfigError};
pub use schema::{
    ComputeConfig, LabConfig, ListenerConfig, LogFormat, ObservabilityConfig, ServiceConfig,
    TelemetryConfig,
};
