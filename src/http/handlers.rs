//! Route handlers.
//!
//! Each handler maps query parameters to a JSON response and holds no state
//! of its own. Malformed or out-of-range parameters are rejected with 400.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::Instrument;

use crate::compute::MemoCompute;
use crate::config::ServiceConfig;
use crate::http::response::AppError;

/// Default `x` for `/slow`.
pub const DEFAULT_X: i64 = 7;

/// Default failure probability for `/error`.
pub const DEFAULT_ERROR_RATE: f64 = 0.2;

/// State injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ServiceConfig>,
    pub compute: Arc<MemoCompute>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HelloParams {
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SlowParams {
    pub x: Option<i64>,
    pub cache: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorParams {
    pub rate: Option<f64>,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": state.service.name,
        "env": state.service.environment,
    }))
}

/// `GET /hello?delay_ms=N`
///
/// The delay is a thread-blocking sleep, run on the blocking pool so that
/// async workers keep serving other requests.
pub async fn hello(
    params: Result<Query<HelloParams>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let delay_ms = params.delay_ms.unwrap_or(0);

    if delay_ms > 0 {
        let delay = Duration::from_millis(delay_ms);
        tokio::task::spawn_blocking(move || std::thread::sleep(delay))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    Ok(Json(json!({ "message": "hello, datadog" })))
}

/// `GET /slow?x=N&cache=0|1`
pub async fn slow(
    State(state): State<AppState>,
    params: Result<Query<SlowParams>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let cache = parse_flag("cache", params.cache.as_deref())?;
    let x = params.x.unwrap_or(DEFAULT_X);
    if x.checked_mul(x).is_none() {
        return Err(AppError::InvalidQuery(format!(
            "x={} is too large to square",
            x
        )));
    }

    let compute = state.compute.clone();
    let result = async move {
        if cache {
            compute.compute_cached(x).await
        } else {
            compute.compute_uncached(x).await
        }
    }
    .instrument(tracing::info_span!("slow_work", x, cache))
    .await;

    Ok(Json(json!({ "result": result, "cache": cache })))
}

/// `GET /error?rate=R`
pub async fn sometimes_errors(
    params: Result<Query<ErrorParams>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let rate = params.rate.unwrap_or(DEFAULT_ERROR_RATE);
    if !(0.0..=1.0).contains(&rate) {
        return Err(AppError::InvalidQuery(format!(
            "rate={} must be between 0 and 1",
            rate
        )));
    }

    if rand::random::<f64>() < rate {
        tracing::debug!(rate, "Injecting failure");
        return Err(AppError::IntentionalFailure);
    }

    Ok(Json(json!({ "ok": true })))
}

/// Fallback for unknown paths.
pub async fn not_found() -> AppError {
    AppError::NotFound
}

/// Parse a boolean query flag. Absent means false.
fn parse_flag(name: &str, raw: Option<&str>) -> Result<bool, AppError> {
    match raw {
        None => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some("0") | Some("false") => Ok(false),
        Some(other) => Err(AppError::InvalidQuery(format!(
            "{}='{}' must be one of 0, 1, true, false",
            name, other
        ))),
    }
}
