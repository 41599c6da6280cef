//! Shared fixtures for the test modules.
//!
//! Fixture data:
//!
//! | Author | id | Books (id: price) |
//! |---|---|---|
//! | Ada Lovelace | 1 | 1: 15.0, 2: 45.5 |
//! | Frank Herbert | 2 | 3: 50.0, 4: 80.0, 5: 120.0 |
//! | Ursula Le Guin | 3 | none |
//!
//! Reviewers: 1 Daisy Herzog, 2 Daisy Miller, 3 Tom Herzog.
//! Reviews (id: book, reviewer): 1: 3,1 · 2: 4,2 · 3: 3,3 · 4: 1,1 · 5: 5,2.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{db, migrations, routes};

pub const BOOK_PRICES: [(i64, f64); 5] = [(1, 15.0), (2, 45.5), (3, 50.0), (4, 80.0), (5, 120.0)];

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    // Keeps the database directory alive for the duration of the test
    _dir: TempDir,
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

pub async fn setup_test_app_with(adjust: impl FnOnce(&mut AppConfig)) -> TestApp {
    let (pool, dir) = setup_test_db().await;
    seed(&pool).await;

    let mut config = AppConfig::default();
    config.database.url = db_url(&dir);
    adjust(&mut config);

    let state = AppState::new(pool, config);
    let app = routes::router(state.clone());
    TestApp { app, state, _dir: dir }
}

/// Empty schema with all migrations applied.
pub async fn setup_test_db() -> (SqlitePool, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut config = AppConfig::default();
    config.database.url = db_url(&dir);
    config.database.max_connections = 4;

    let pool = db::connect(&config.database).await.unwrap();
    db::init_db(&pool).await.unwrap();
    migrations::run_pending(&pool).await.unwrap();
    (pool, dir)
}

fn db_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("bookbench-test.db").display())
}

pub async fn seed(pool: &SqlitePool) {
    for (id, first, last) in [(1, "Ada", "Lovelace"), (2, "Frank", "Herbert"), (3, "Ursula", "Le Guin")] {
        sqlx::query(r#"INSERT INTO "Authors" ("id", "firstName", "lastName", "email") VALUES (?1, ?2, ?3, ?4)"#)
            .bind(id)
            .bind(first)
            .bind(last)
            .bind(format!("{}@example.com", first.to_lowercase()))
            .execute(pool)
            .await
            .unwrap();
    }

    let books = [(1, 1, "Notes"), (2, 1, "Engine"), (3, 2, "Dune"), (4, 2, "Messiah"), (5, 2, "Children")];
    for ((id, author_id, title), (_, price)) in books.into_iter().zip(BOOK_PRICES) {
        sqlx::query(r#"INSERT INTO "Books" ("id", "authorId", "title", "price") VALUES (?1, ?2, ?3, ?4)"#)
            .bind(id)
            .bind(author_id)
            .bind(title)
            .bind(price)
            .execute(pool)
            .await
            .unwrap();
    }

    for (id, first, last) in [(1, "Daisy", "Herzog"), (2, "Daisy", "Miller"), (3, "Tom", "Herzog")] {
        sqlx::query(r#"INSERT INTO "Reviewers" ("id", "firstName", "lastName") VALUES (?1, ?2, ?3)"#)
            .bind(id)
            .bind(first)
            .bind(last)
            .execute(pool)
            .await
            .unwrap();
    }

    for (id, book_id, reviewer_id) in [(1, 3, 1), (2, 4, 2), (3, 3, 3), (4, 1, 1), (5, 5, 2)] {
        sqlx::query(r#"INSERT INTO "Reviews" ("id", "bookId", "reviewerId", "body") VALUES (?1, ?2, ?3, ?4)"#)
            .bind(id)
            .bind(book_id)
            .bind(reviewer_id)
            .bind(format!("review {}", id))
            .execute(pool)
            .await
            .unwrap();
    }
}

/// Sends a request and returns the status with the body parsed as JSON
/// (or as a JSON string when the body is plain text).
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn patch_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("PATCH")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// The `id` field of every element of a JSON array.
pub fn ids(body: &Value) -> Vec<i64> {
    body.as_array().unwrap().iter().map(|item| item["id"].as_i64().unwrap()).collect()
}
