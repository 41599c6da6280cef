use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use crate::{
    error::{AppError, AppResult},
    filters::{ReviewQuery, ReviewerFilter},
    state::AppState,
    types::ReviewWithReviewer,
};

/// `GET /reviews?firstName=&lastName=`
///
/// Each given name narrows the result; a missing or blank one matches everyone.
pub async fn list_reviews(
    State(state): State<AppState>,
    query: Result<Query<ReviewQuery>, QueryRejection>,
) -> AppResult<Json<Vec<ReviewWithReviewer>>> {
    let Query(query) = query.map_err(|rejection| {
        state.metrics.inc_invalid_requests();
        AppError::InvalidInput(rejection.body_text())
    })?;
    let filter = ReviewerFilter::from_query(&query);
    tracing::debug!(
        first_name = ?filter.first_name,
        last_name = ?filter.last_name,
        filtered = !filter.is_empty(),
        "listing reviews"
    );

    let reviews = state.store.list_reviews(&filter).await?;
    state.metrics.add_reviews_listed(reviews.len() as u64);
    Ok(Json(reviews))
}
