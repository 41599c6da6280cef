use std::str::FromStr;
use std::time::{Duration, Instant};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::config::{self, DatabaseConfig};
use crate::metrics::Metrics;

/// Opens the process-wide pool. The database file and its parent directory
/// are created when missing.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    config::ensure_sqlite_parent_dir(&cfg.url)?;
    let options = SqliteConnectOptions::from_str(&cfg.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(10));

    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // Best-effort tuning; a failure here is not fatal
                if let Err(e) = sqlx::query("PRAGMA cache_size=-65536;").execute(&mut *conn).await {
                    tracing::warn!("Failed to set cache_size: {}", e);
                }
                if let Err(e) = sqlx::query("PRAGMA temp_store=MEMORY;").execute(&mut *conn).await {
                    tracing::warn!("Failed to set temp_store: {}", e);
                }
                Ok(())
            })
        })
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Creates the four tables and the foreign-key indexes. Price and name
/// indexes are owned by the migrations.
pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    // Foreign keys are critical - fail if this doesn't work
    sqlx::query("PRAGMA foreign_keys=ON;").execute(pool).await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS "Authors" (
            "id" INTEGER PRIMARY KEY AUTOINCREMENT,
            "firstName" TEXT NOT NULL,
            "lastName" TEXT NOT NULL,
            "email" TEXT NULL,
            "birthdate" TEXT NULL,
            "createdAt" TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            "updatedAt" TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS "Books" (
            "id" INTEGER PRIMARY KEY AUTOINCREMENT,
            "authorId" INTEGER NOT NULL,
            "title" TEXT NOT NULL,
            "description" TEXT NULL,
            "date" TEXT NULL,
            "price" REAL NOT NULL DEFAULT 0,
            "createdAt" TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            "updatedAt" TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            FOREIGN KEY("authorId") REFERENCES "Authors"("id") ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS "Reviewers" (
            "id" INTEGER PRIMARY KEY AUTOINCREMENT,
            "firstName" TEXT NOT NULL,
            "lastName" TEXT NOT NULL,
            "createdAt" TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            "updatedAt" TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS "Reviews" (
            "id" INTEGER PRIMARY KEY AUTOINCREMENT,
            "bookId" INTEGER NOT NULL,
            "reviewerId" INTEGER NOT NULL,
            "body" TEXT NULL,
            "createdAt" TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            "updatedAt" TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            FOREIGN KEY("bookId") REFERENCES "Books"("id") ON DELETE CASCADE,
            FOREIGN KEY("reviewerId") REFERENCES "Reviewers"("id") ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        ("idx_books_author", r#"CREATE INDEX IF NOT EXISTS "idx_books_author" ON "Books"("authorId")"#),
        ("idx_reviews_book", r#"CREATE INDEX IF NOT EXISTS "idx_reviews_book" ON "Reviews"("bookId")"#),
        (
            "idx_reviews_reviewer",
            r#"CREATE INDEX IF NOT EXISTS "idx_reviews_reviewer" ON "Reviews"("reviewerId")"#,
        ),
    ];

    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            match &e {
                sqlx::Error::Database(db_err) => {
                    let msg = db_err.message().to_lowercase();
                    if msg.contains("already exists") || msg.contains("duplicate") {
                        tracing::debug!("Index {} already exists, skipping", name);
                    } else {
                        tracing::warn!("Failed to create index {}: {}", name, e);
                    }
                }
                _ => {
                    tracing::warn!("Failed to create index {}: {}", name, e);
                }
            }
        }
    }

    Ok(())
}

/// Measures one store query. Elapsed time is logged at debug, or at warn once
/// it reaches the slow threshold.
///
/// A timer dropped without [`QueryTimer::finish`] belongs to a query that
/// returned an error (or whose future was cancelled); it is logged and counted
/// as failed, and still counted as slow past the threshold.
pub struct QueryTimer {
    label: &'static str,
    started: Instant,
    slow: Duration,
    metrics: Metrics,
    finished: bool,
}

impl QueryTimer {
    pub fn start(label: &'static str, slow: Duration, metrics: Metrics) -> Self {
        Self { label, started: Instant::now(), slow, metrics, finished: false }
    }

    /// Logs the measurement of a completed query.
    pub fn finish(mut self, rows: usize) {
        self.finished = true;
        let elapsed = self.started.elapsed();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        if elapsed >= self.slow {
            self.metrics.inc_slow_queries();
            tracing::warn!(query = self.label, rows, elapsed_ms, "slow query");
        } else {
            tracing::debug!(query = self.label, rows, elapsed_ms, "query executed");
        }
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let elapsed = self.started.elapsed();
        let slow = elapsed >= self.slow;
        self.metrics.inc_failed_queries();
        if slow {
            self.metrics.inc_slow_queries();
        }
        tracing::warn!(query = self.label, elapsed_ms = elapsed.as_secs_f64() * 1000.0, slow, "query failed");
    }
}
