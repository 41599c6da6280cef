use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::store::Store;

/// The shared application state.
///
/// Cloned into every handler by Axum; all fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool, used directly by the readiness probe.
    pub db: sqlx::SqlitePool,
    /// The persistence layer the resource routes delegate to.
    pub store: Store,
    pub config: Arc<AppConfig>,
    pub metrics: Metrics,
}

impl AppState {
    /// Creates the state around an already initialised pool.
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> Self {
        let metrics = Metrics::new();
        let slow_query = Duration::from_millis(config.benchmark.slow_query_ms);
        let store = Store::new(db.clone(), slow_query, metrics.clone());
        Self { db, store, config: Arc::new(config), metrics }
    }
}
