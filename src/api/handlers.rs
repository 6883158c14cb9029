//! API Handlers
//!
//! HTTP request handlers for each key-value server endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::config::Config;
use crate::error::Result;
use crate::middleware::Throttle;
use crate::models::{HealthResponse, StatsResponse};
use crate::service::KvService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache, store and transaction log
    pub service: Arc<KvService>,
    /// Per-client throttle, when enabled
    pub throttle: Option<Arc<Throttle>>,
}

impl AppState {
    /// Creates a new AppState around an opened service, without throttling.
    pub fn new(service: KvService) -> Self {
        Self {
            service: Arc::new(service),
            throttle: None,
        }
    }

    /// Opens the service (replaying its log) and the throttle from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let service = KvService::open(config)?;
        Ok(Self {
            service: Arc::new(service),
            throttle: config.throttle.map(|t| Arc::new(Throttle::new(t))),
        })
    }
}

/// Handler for PUT /v1/:key
///
/// Stores the raw request body under `key`.
pub async fn put_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<StatusCode> {
    state.service.put(&key, body).await?;
    Ok(StatusCode::CREATED)
}

/// Handler for GET /v1/:key
///
/// Returns the stored value as the raw response body.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Bytes> {
    state.service.get(&key)
}

/// Handler for DELETE /v1/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    state.service.delete(&key).await?;
    Ok(StatusCode::OK)
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.service.stats();
    Json(StatsResponse::new(&stats, state.service.last_sequence()))
}

/// Handler for GET /health
///
/// Reports "degraded" once the transaction log writer has failed.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    match state.service.log_failure() {
        Some(failure) => Json(HealthResponse::degraded(failure.to_string())),
        None => Json(HealthResponse::healthy()),
    }
}
