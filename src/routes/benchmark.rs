use std::time::Instant;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
    types::BookDetail,
};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// `GET /test-benchmark-logging?limit=&offset=`
///
/// Loads a page of books with every association and logs how long it took.
/// Meant for watching the query log, not for clients.
pub async fn book_details(
    State(state): State<AppState>,
    page: Result<Query<PageQuery>, QueryRejection>,
) -> AppResult<Json<Vec<BookDetail>>> {
    let Query(page) = page.map_err(|rejection| {
        state.metrics.inc_invalid_requests();
        AppError::InvalidInput(rejection.body_text())
    })?;
    let cfg = &state.config.benchmark;
    // max_limit below 1 is only rejected by config::validate, which AppState::new does not run
    let limit = page.limit.unwrap_or(cfg.default_limit).min(cfg.max_limit).max(1);
    let offset = page.offset.unwrap_or(cfg.default_offset).max(0);

    let started = Instant::now();
    let details = state.store.book_details(limit, offset).await?;
    tracing::info!(
        limit,
        offset,
        books = details.len(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "benchmark page loaded"
    );
    state.metrics.add_books_listed(details.len() as u64);
    Ok(Json(details))
}
