use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use crate::{
    error::{author_not_found, validation, AppError, AppResult, OptionExt},
    filters::{BookFilter, BookListQuery},
    state::AppState,
    types::{Book, BookWithAuthor, UpdatePriceRequest, UpdatePriceResponse},
};

/// `GET /books?maxPrice=`
pub async fn list_books(
    State(state): State<AppState>,
    query: Result<Query<BookListQuery>, QueryRejection>,
) -> AppResult<Json<Vec<BookWithAuthor>>> {
    let Query(query) = query.map_err(|rejection| {
        state.metrics.inc_invalid_requests();
        AppError::InvalidInput(rejection.body_text())
    })?;
    let filter = BookFilter::from_query(&query, state.config.filters.lenient_max_price).inspect_err(|_| {
        state.metrics.inc_invalid_requests();
    })?;
    tracing::debug!(max_price = ?filter.max_price, filtered = !filter.is_empty(), "listing books");

    let books = state.store.list_books(&filter).await?;
    state.metrics.add_books_listed(books.len() as u64);
    Ok(Json(books))
}

/// `GET /authors/{authorId}/books`
pub async fn author_books(
    State(state): State<AppState>,
    Path(author_id): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let author_id = parse_author_id(&state, &author_id)?;
    let author = state.store.find_author(author_id).await?.ok_or_author_not_found(author_id).inspect_err(
        |_| {
            state.metrics.inc_authors_not_found();
        },
    )?;

    let books = state.store.books_by_author(author.id).await?;
    state.metrics.add_books_listed(books.len() as u64);
    Ok(Json(books))
}

/// `PATCH /authors/{authorId}/books` with `{ "price": <number> }`
///
/// All of the author's books change in one transaction; see
/// [`crate::store::Store::set_author_book_prices`].
pub async fn update_author_book_prices(
    State(state): State<AppState>,
    Path(author_id): Path<String>,
    body: Result<Json<UpdatePriceRequest>, JsonRejection>,
) -> AppResult<Json<UpdatePriceResponse>> {
    let author_id = parse_author_id(&state, &author_id)?;
    let Json(req) = body.map_err(|rejection| {
        state.metrics.inc_invalid_requests();
        AppError::BadRequest(rejection.body_text())
    })?;
    validation::validate_price(req.price, "price").inspect_err(|_| {
        state.metrics.inc_invalid_requests();
    })?;

    let Some(repriced) = state.store.set_author_book_prices(author_id, req.price).await? else {
        state.metrics.inc_authors_not_found();
        return Err(author_not_found(author_id));
    };

    state.metrics.inc_price_updates();
    state.metrics.add_books_repriced(repriced.changed);
    tracing::info!(
        author_id,
        price = req.price,
        books = repriced.books.len(),
        changed = repriced.changed,
        "author book prices updated"
    );

    Ok(Json(UpdatePriceResponse {
        message: format!("Successfully updated all books of author {}.", author_id),
        books: repriced.books,
    }))
}

fn parse_author_id(state: &AppState, raw: &str) -> AppResult<i64> {
    validation::parse_author_id(raw).inspect_err(|_| {
        state.metrics.inc_invalid_requests();
    })
}
