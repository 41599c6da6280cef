use crate::{state::AppState, types::MessageResponse};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

// Root route: tells clients the API is up
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse { message: "API server is running".to_string() })
}

// Health check endpoint - lightweight, never touches the database
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// Readiness probe: checks DB connectivity with timeout protection
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let query = sqlx::query("SELECT 1").fetch_one(&state.db);
    match tokio::time::timeout(std::time::Duration::from_secs(5), query).await {
        Ok(Ok(_)) => (StatusCode::OK, "ready").into_response(),
        Ok(Err(e)) => (StatusCode::SERVICE_UNAVAILABLE, format!("not ready: {}", e)).into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "not ready: timeout").into_response(),
    }
}

// Metrics endpoint: returns JSON snapshot
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.get_snapshot())
}

// Prometheus-compatible text exposition format
pub async fn metrics_prometheus(State(state): State<AppState>) -> impl IntoResponse {
    let m = state.metrics.get_snapshot();
    let body = format!(
        "# HELP bookbench_books_listed Books returned by listing routes\n# TYPE bookbench_books_listed counter\nbookbench_books_listed {}\n\
# HELP bookbench_reviews_listed Reviews returned by the reviews route\n# TYPE bookbench_reviews_listed counter\nbookbench_reviews_listed {}\n\
# HELP bookbench_price_updates Bulk price updates committed\n# TYPE bookbench_price_updates counter\nbookbench_price_updates {}\n\
# HELP bookbench_books_repriced Books whose price changed\n# TYPE bookbench_books_repriced counter\nbookbench_books_repriced {}\n\
# HELP bookbench_authors_not_found Requests for unknown authors\n# TYPE bookbench_authors_not_found counter\nbookbench_authors_not_found {}\n\
# HELP bookbench_invalid_requests Requests rejected as invalid\n# TYPE bookbench_invalid_requests counter\nbookbench_invalid_requests {}\n\
# HELP bookbench_slow_queries Queries above the slow threshold\n# TYPE bookbench_slow_queries counter\nbookbench_slow_queries {}\n\
# HELP bookbench_failed_queries Queries that returned an error\n# TYPE bookbench_failed_queries counter\nbookbench_failed_queries {}\n\
# HELP bookbench_uptime_seconds Uptime seconds\n# TYPE bookbench_uptime_seconds gauge\nbookbench_uptime_seconds {}\n",
        m.books_listed,
        m.reviews_listed,
        m.price_updates,
        m.books_repriced,
        m.authors_not_found,
        m.invalid_requests,
        m.slow_queries,
        m.failed_queries,
        m.uptime_seconds,
    );
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

// Version/Build info endpoint (JSON)
pub async fn version() -> impl IntoResponse {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "package": {
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "authors": env!("CARGO_PKG_AUTHORS"),
            "license": env!("CARGO_PKG_LICENSE"),
        },
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        }
    });
    (StatusCode::OK, Json(body))
}
