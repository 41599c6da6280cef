use std::time::Duration;

use bookbench::config::AppConfig;
use bookbench::filters::BookFilter;
use bookbench::metrics::Metrics;
use bookbench::store::Store;
use bookbench::{db, migrations};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tempfile::TempDir;
use tokio::runtime::Runtime;

const AUTHORS: i64 = 500;
const BOOKS: i64 = 20_000;

async fn seeded_pool(dir: &TempDir) -> SqlitePool {
    let mut cfg = AppConfig::default();
    cfg.database.url = format!("sqlite://{}", dir.path().join("bench.db").display());
    cfg.database.max_connections = 1;
    let pool = db::connect(&cfg.database).await.unwrap();
    db::init_db(&pool).await.unwrap();
    migrations::run_pending(&pool).await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    let authors: Vec<i64> = (1..=AUTHORS).collect();
    for chunk in authors.chunks(300) {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(r#"INSERT INTO "Authors" ("id", "firstName", "lastName") "#);
        qb.push_values(chunk, |mut b, id| {
            b.push_bind(*id).push_bind(format!("First{}", id)).push_bind(format!("Last{}", id));
        });
        qb.build().execute(&mut *tx).await.unwrap();
    }
    let books: Vec<i64> = (1..=BOOKS).collect();
    for chunk in books.chunks(200) {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(r#"INSERT INTO "Books" ("id", "authorId", "title", "price") "#);
        qb.push_values(chunk, |mut b, id| {
            // Deterministic spread of prices over 1..=500
            let price = ((id * 7919) % 500 + 1) as f64;
            b.push_bind(*id).push_bind(id % AUTHORS + 1).push_bind(format!("Book {}", id)).push_bind(price);
        });
        qb.build().execute(&mut *tx).await.unwrap();
    }
    tx.commit().await.unwrap();
    pool
}

fn benchmark_list_books(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let dir = TempDir::new().unwrap();
    let pool = rt.block_on(seeded_pool(&dir));
    let store = Store::new(pool.clone(), Duration::from_secs(60), Metrics::new());

    let mut group = c.benchmark_group("list_books");
    group.sample_size(20);
    for bound in [Some(10.0), Some(250.0), None] {
        let label = bound.map(|b| format!("max_{}", b)).unwrap_or_else(|| "unfiltered".to_string());
        let filter = BookFilter { max_price: bound };
        group.bench_with_input(BenchmarkId::new("indexed", &label), &filter, |b, filter| {
            b.iter(|| rt.block_on(async { black_box(store.list_books(filter).await.unwrap().len()) }))
        });
    }

    // Same queries once the price and name indexes are gone
    rt.block_on(async {
        while migrations::revert_last(&pool).await.unwrap().is_some() {}
    });
    for bound in [Some(10.0), Some(250.0)] {
        let label = bound.map(|b| format!("max_{}", b)).unwrap_or_default();
        let filter = BookFilter { max_price: bound };
        group.bench_with_input(BenchmarkId::new("no_index", &label), &filter, |b, filter| {
            b.iter(|| rt.block_on(async { black_box(store.list_books(filter).await.unwrap().len()) }))
        });
    }
    group.finish();
}

fn benchmark_reprice(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let dir = TempDir::new().unwrap();
    let pool = rt.block_on(seeded_pool(&dir));
    let store = Store::new(pool, Duration::from_secs(60), Metrics::new());

    let mut price = 0.0;
    c.bench_function("reprice_author_books", |b| {
        b.iter(|| {
            price += 1.0;
            rt.block_on(async { black_box(store.set_author_book_prices(42, price).await.unwrap()) })
        })
    });
}

criterion_group!(benches, benchmark_list_books, benchmark_reprice);
criterion_main!(benches);
