//! HTTP route handlers for the Bookbench API.
//!
//! - `books`: book listing, author-scoped lookup and the bulk price update
//! - `reviews`: reviews filtered by reviewer name
//! - `benchmark`: the fully eager-loaded page used to watch query timings
//! - `health`: root message, probes, metrics and version

pub mod benchmark;
pub mod books;
pub mod health;
pub mod reviews;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::{routing::get, Router};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware;
use crate::state::AppState;

/// Builds the application router with all middleware applied.
pub fn router(state: AppState) -> Router {
    let cfg_arc = state.config.clone();
    let body_limit = state.config.server.max_body_bytes;

    Router::new()
        .route("/", get(health::root))
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .route("/metrics/prometheus", get(health::metrics_prometheus))
        .route("/version", get(health::version))
        .route("/books", get(books::list_books))
        .route(
            "/authors/{author_id}/books",
            get(books::author_books).patch(books::update_author_book_prices),
        )
        .route("/reviews", get(reviews::list_reviews))
        .route("/test-benchmark-logging", get(benchmark::book_details))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn_with_state(cfg_arc.clone(), middleware::validation::validate_request_middleware))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(cfg_arc, middleware::security_headers::security_headers_middleware))
}
