//! API Handlers
//!
//! HTTP request handlers for each endpoint. Handlers validate input, then
//! hand the cache-aside operation to the worker pool and await its reply;
//! no cache or store work runs on the async runtime.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use crate::cache::LruCache;
use crate::config::Config;
use crate::coordinator::CacheAside;
use crate::error::{KvError, Result};
use crate::models::{
    validate_key, validate_value, CreateRequest, GetResponse, HealthResponse, PoolStats, PutBody,
    PutQuery, StatsResponse, WriteResponse,
};
use crate::pool::WorkerPool;
use crate::store::BackingStore;

/// Application state shared across all handlers.
///
/// Holds the injected coordinator and the worker pool that runs it.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CacheAside>,
    pub pool: Arc<WorkerPool>,
}

impl AppState {
    pub fn new(service: CacheAside, pool: WorkerPool) -> Self {
        Self {
            service: Arc::new(service),
            pool: Arc::new(pool),
        }
    }

    /// Builds the cache, worker pool and coordinator around an opened store.
    pub fn from_config(config: &Config, store: Arc<dyn BackingStore>) -> std::io::Result<Self> {
        let cache = Arc::new(LruCache::new(config.cache_capacity));
        let service = CacheAside::new(cache, store)
            .with_invalidate_on_missing_delete(config.invalidate_on_missing_delete);
        let pool = WorkerPool::new(config.worker_threads)?;
        Ok(Self::new(service, pool))
    }
}

fn check_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(msg) => Err(KvError::InvalidRequest(msg)),
        None => Ok(()),
    }
}

fn check_value(value: &str) -> Result<()> {
    match validate_value(value) {
        Some(msg) => Err(KvError::InvalidRequest(msg)),
        None => Ok(()),
    }
}

/// Handler for PUT /kv/*key
///
/// The value comes from a JSON body `{"value": ..}`, or failing that from
/// the `value` (or `v`) query parameter.
pub async fn put_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<PutQuery>,
    body: Option<Json<PutBody>>,
) -> Result<Json<WriteResponse>> {
    check_key(&key)?;
    let value = body
        .map(|Json(body)| body.value)
        .or(query.value)
        .ok_or_else(|| KvError::InvalidRequest("Missing 'value' in body or query".to_string()))?;
    check_value(&value)?;
    debug!("PUT /kv/{} ({} bytes)", key, value.len());

    let service = Arc::clone(&state.service);
    let task_key = key.clone();
    state.pool.run(move || service.put(task_key, value)).await?;

    Ok(Json(WriteResponse::stored(key)))
}

/// Handler for POST /kv
///
/// Body: `{"key": "..", "value": ".."}`. Responds 201 Created.
pub async fn create_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<WriteResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(KvError::InvalidRequest(error_msg));
    }
    debug!("POST /kv key={} ({} bytes)", req.key, req.value.len());

    let service = Arc::clone(&state.service);
    let CreateRequest { key, value } = req;
    let task_key = key.clone();
    state.pool.run(move || service.put(task_key, value)).await?;

    Ok((StatusCode::CREATED, Json(WriteResponse::created(key))))
}

/// Handler for GET /kv/*key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    check_key(&key)?;

    let service = Arc::clone(&state.service);
    let task_key = key.clone();
    let lookup = state.pool.run(move || service.get(&task_key)).await?;

    debug!("GET /kv/{} served from {:?}", key, lookup.source);
    Ok(Json(GetResponse::new(key, lookup)))
}

/// Handler for DELETE /kv/*key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<WriteResponse>> {
    check_key(&key)?;

    let service = Arc::clone(&state.service);
    let task_key = key.clone();
    state.pool.run(move || service.delete(&task_key)).await?;

    Ok(Json(WriteResponse::deleted(key)))
}

/// Handler for GET /stats
///
/// Cache counters plus worker pool occupancy.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.service.stats();
    let pool = PoolStats {
        workers: state.pool.worker_count(),
        queued: state.pool.queued(),
        panicked: state.pool.panicked(),
    };

    Json(StatsResponse::new(&stats, pool))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
