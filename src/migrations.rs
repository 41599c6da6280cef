//! Versioned schema changes on top of [`crate::db::init_db`].
//!
//! Applied migrations are recorded by name in `schema_migrations`. Each
//! migration runs in its own transaction together with its bookkeeping row.

use sqlx::{Row, SqlitePool};

/// One reversible schema change.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub up: &'static [&'static str],
    pub down: &'static [&'static str],
}

/// All migrations, oldest first.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "20240315071327-add-index-to-books",
        up: &[r#"CREATE INDEX IF NOT EXISTS "books_price" ON "Books"("price")"#],
        down: &[r#"DROP INDEX IF EXISTS "books_price""#],
    },
    Migration {
        name: "20240315093028-add-index-to-reviewers",
        up: &[
            r#"CREATE INDEX IF NOT EXISTS "reviewers_first_name_last_name" ON "Reviewers"("firstName", "lastName")"#,
            r#"CREATE INDEX IF NOT EXISTS "reviewers_first_name" ON "Reviewers"("firstName")"#,
            r#"CREATE INDEX IF NOT EXISTS "reviewers_last_name" ON "Reviewers"("lastName")"#,
        ],
        down: &[
            r#"DROP INDEX IF EXISTS "reviewers_first_name_last_name""#,
            r#"DROP INDEX IF EXISTS "reviewers_first_name""#,
            r#"DROP INDEX IF EXISTS "reviewers_last_name""#,
        ],
    },
];

async fn ensure_meta_table(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS schema_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now'))
        )"#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Names of applied migrations, oldest first.
pub async fn applied(pool: &SqlitePool) -> anyhow::Result<Vec<String>> {
    ensure_meta_table(pool).await?;
    let rows = sqlx::query("SELECT name FROM schema_migrations ORDER BY name")
        .fetch_all(pool)
        .await?;
    let mut names = Vec::with_capacity(rows.len());
    for row in rows {
        names.push(row.try_get::<String, _>("name")?);
    }
    Ok(names)
}

/// Applies every migration not yet recorded and returns the names it applied.
pub async fn run_pending(pool: &SqlitePool) -> anyhow::Result<Vec<&'static str>> {
    run_pending_from(pool, MIGRATIONS).await
}

pub(crate) async fn run_pending_from(
    pool: &SqlitePool,
    migrations: &[Migration],
) -> anyhow::Result<Vec<&'static str>> {
    let done = applied(pool).await?;
    let mut ran = Vec::new();
    for m in migrations {
        if done.iter().any(|n| n == m.name) {
            continue;
        }
        let mut tx = pool.begin().await?;
        for stmt in m.up {
            sqlx::query(stmt)
                .execute(&mut *tx)
                .await
                .map_err(|e| anyhow::anyhow!("migration {} failed: {}", m.name, e))?;
        }
        sqlx::query("INSERT INTO schema_migrations (name) VALUES (?1)")
            .bind(m.name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!(migration = m.name, "migration applied");
        ran.push(m.name);
    }
    Ok(ran)
}

/// Reverts the most recently applied migration. Returns `None` when nothing
/// is applied.
pub async fn revert_last(pool: &SqlitePool) -> anyhow::Result<Option<&'static str>> {
    revert_last_from(pool, MIGRATIONS).await
}

pub(crate) async fn revert_last_from(
    pool: &SqlitePool,
    migrations: &[Migration],
) -> anyhow::Result<Option<&'static str>> {
    let done = applied(pool).await?;
    let Some(last) = done.last() else {
        return Ok(None);
    };
    let m = migrations
        .iter()
        .find(|m| m.name == last)
        .ok_or_else(|| anyhow::anyhow!("applied migration {} is unknown to this build", last))?;

    let mut tx = pool.begin().await?;
    for stmt in m.down {
        sqlx::query(stmt)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow::anyhow!("revert of {} failed: {}", m.name, e))?;
    }
    sqlx::query("DELETE FROM schema_migrations WHERE name = ?1")
        .bind(m.name)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    tracing::info!(migration = m.name, "migration reverted");
    Ok(Some(m.name))
}
