//! Persistence layer behind the resource routes.
//!
//! Filters arrive typed and leave as bound SQL predicates. Every query is
//! timed through [`QueryTimer`].

use std::collections::HashMap;
use std::time::Duration;

use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::db::QueryTimer;
use crate::error::AppResult;
use crate::filters::{BookFilter, ReviewerFilter};
use crate::metrics::Metrics;
use crate::types::{Author, Book, BookDetail, BookWithAuthor, Review, ReviewWithReviewer, Reviewer, ReviewerName};

// SQLite caps bound parameters per statement (commonly 999).
const MAX_IN_LIST: usize = 500;

const BOOK_COLUMNS: &str = r#"b."id", b."authorId", b."title", b."description", b."date", b."price", b."createdAt", b."updatedAt""#;
const AUTHOR_COLUMNS: &str = r#"a."id" AS "a_id", a."firstName" AS "a_firstName", a."lastName" AS "a_lastName", a."email" AS "a_email", a."birthdate" AS "a_birthdate", a."createdAt" AS "a_createdAt", a."updatedAt" AS "a_updatedAt""#;
const REVIEW_COLUMNS: &str = r#"r."id", r."bookId", r."reviewerId", r."body", r."createdAt", r."updatedAt""#;

/// Result of a bulk price update.
#[derive(Debug, Clone)]
pub struct Repriced {
    /// The author's books as committed.
    pub books: Vec<Book>,
    /// Rows whose price actually changed.
    pub changed: u64,
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    slow_query: Duration,
    metrics: Metrics,
}

impl Store {
    pub fn new(pool: SqlitePool, slow_query: Duration, metrics: Metrics) -> Self {
        Self { pool, slow_query, metrics }
    }

    fn timer(&self, label: &'static str) -> QueryTimer {
        QueryTimer::start(label, self.slow_query, self.metrics.clone())
    }

    /// Books matching `filter`, each joined with its author, ordered by id.
    pub async fn list_books(&self, filter: &BookFilter) -> AppResult<Vec<BookWithAuthor>> {
        let timer = self.timer("books.list");
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(BOOK_COLUMNS)
            .push(", ")
            .push(AUTHOR_COLUMNS)
            .push(r#" FROM "Books" AS b LEFT OUTER JOIN "Authors" AS a ON b."authorId" = a."id""#);
        filter.push_where(&mut qb, "b");
        qb.push(r#" ORDER BY b."id""#);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(BookWithAuthor { book: book_from_row(row)?, author: joined_author(row)? });
        }
        timer.finish(items.len());
        Ok(items)
    }

    pub async fn find_author(&self, author_id: i64) -> AppResult<Option<Author>> {
        let timer = self.timer("authors.find");
        let row = sqlx::query(
            r#"SELECT "id", "firstName", "lastName", "email", "birthdate", "createdAt", "updatedAt"
               FROM "Authors" WHERE "id" = ?1"#,
        )
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;
        let author = row.as_ref().map(author_from_row).transpose()?;
        timer.finish(usize::from(author.is_some()));
        Ok(author)
    }

    /// Books of one author, ordered by id.
    pub async fn books_by_author(&self, author_id: i64) -> AppResult<Vec<Book>> {
        let timer = self.timer("books.by_author");
        let books = select_author_books(&self.pool, author_id).await?;
        timer.finish(books.len());
        Ok(books)
    }

    /// Sets the price of every book of `author_id` in one transaction.
    ///
    /// Returns `None` when the author does not exist; nothing is changed then.
    /// Books that already carry `price` keep their `updatedAt`.
    pub async fn set_author_book_prices(&self, author_id: i64, price: f64) -> AppResult<Option<Repriced>> {
        let timer = self.timer("books.reprice");
        let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();

        // Write first so the transaction holds the write lock from its first statement.
        // Dropping `tx` on an early return rolls it back.
        let mut tx = self.pool.begin().await?;
        let changed = sqlx::query(
            r#"UPDATE "Books" SET "price" = ?1, "updatedAt" = ?2
               WHERE "authorId" = ?3 AND "price" IS NOT ?1"#,
        )
        .bind(price)
        .bind(&now)
        .bind(author_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let exists = sqlx::query(r#"SELECT 1 FROM "Authors" WHERE "id" = ?1"#)
            .bind(author_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            tx.rollback().await?;
            timer.finish(0);
            return Ok(None);
        }

        let books = select_author_books(&mut *tx, author_id).await?;
        tx.commit().await?;

        timer.finish(books.len());
        Ok(Some(Repriced { books, changed }))
    }

    /// Reviews whose reviewer matches `filter`, with the reviewer's name, ordered by id.
    pub async fn list_reviews(&self, filter: &ReviewerFilter) -> AppResult<Vec<ReviewWithReviewer>> {
        let timer = self.timer("reviews.list");
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(REVIEW_COLUMNS)
            .push(r#", v."firstName" AS "v_firstName", v."lastName" AS "v_lastName""#)
            .push(r#" FROM "Reviews" AS r INNER JOIN "Reviewers" AS v ON r."reviewerId" = v."id""#);
        filter.push_where(&mut qb, "v");
        qb.push(r#" ORDER BY r."id""#);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(ReviewWithReviewer {
                review: review_from_row(row)?,
                reviewer: ReviewerName {
                    first_name: row.try_get("v_firstName")?,
                    last_name: row.try_get("v_lastName")?,
                },
            });
        }
        timer.finish(items.len());
        Ok(items)
    }

    /// A page of books with author, reviews and reviewers.
    pub async fn book_details(&self, limit: i64, offset: i64) -> AppResult<Vec<BookDetail>> {
        let timer = self.timer("books.details.page");
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(BOOK_COLUMNS)
            .push(", ")
            .push(AUTHOR_COLUMNS)
            .push(r#" FROM "Books" AS b LEFT OUTER JOIN "Authors" AS a ON b."authorId" = a."id""#)
            .push(r#" ORDER BY b."id" LIMIT "#)
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut details = Vec::with_capacity(rows.len());
        for row in &rows {
            details.push(BookDetail {
                book: book_from_row(row)?,
                author: joined_author(row)?,
                reviews: Vec::new(),
                reviewers: Vec::new(),
            });
        }
        timer.finish(details.len());

        let ids: Vec<i64> = details.iter().map(|d| d.book.id).collect();
        if ids.is_empty() {
            return Ok(details);
        }

        let timer = self.timer("books.details.reviews");
        let mut by_book: HashMap<i64, Vec<(Review, Reviewer)>> = HashMap::new();
        let mut fetched = 0usize;
        for chunk in ids.chunks(MAX_IN_LIST) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
            qb.push(REVIEW_COLUMNS)
                .push(r#", v."id" AS "v_id", v."firstName" AS "v_firstName", v."lastName" AS "v_lastName", v."createdAt" AS "v_createdAt", v."updatedAt" AS "v_updatedAt""#)
                .push(r#" FROM "Reviews" AS r INNER JOIN "Reviewers" AS v ON r."reviewerId" = v."id""#)
                .push(r#" WHERE r."bookId" IN ("#);
            let mut list = qb.separated(", ");
            for id in chunk {
                list.push_bind(*id);
            }
            list.push_unseparated(r#") ORDER BY r."id""#);

            let rows = qb.build().fetch_all(&self.pool).await?;
            fetched += rows.len();
            for row in &rows {
                let review = review_from_row(row)?;
                let reviewer = Reviewer {
                    id: row.try_get("v_id")?,
                    first_name: row.try_get("v_firstName")?,
                    last_name: row.try_get("v_lastName")?,
                    created_at: row.try_get("v_createdAt")?,
                    updated_at: row.try_get("v_updatedAt")?,
                };
                by_book.entry(review.book_id).or_default().push((review, reviewer));
            }
        }
        timer.finish(fetched);

        for detail in &mut details {
            if let Some(pairs) = by_book.remove(&detail.book.id) {
                for (review, reviewer) in pairs {
                    if !detail.reviewers.iter().any(|r| r.id == reviewer.id) {
                        detail.reviewers.push(reviewer);
                    }
                    detail.reviews.push(review);
                }
            }
        }
        Ok(details)
    }
}

async fn select_author_books<'e, E>(executor: E, author_id: i64) -> Result<Vec<Book>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"SELECT b."id", b."authorId", b."title", b."description", b."date", b."price", b."createdAt", b."updatedAt"
           FROM "Books" AS b WHERE b."authorId" = ?1 ORDER BY b."id""#,
    )
    .bind(author_id)
    .fetch_all(executor)
    .await?;
    rows.iter().map(book_from_row).collect()
}

fn book_from_row(row: &SqliteRow) -> Result<Book, sqlx::Error> {
    Ok(Book {
        id: row.try_get("id")?,
        author_id: row.try_get("authorId")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        date: row.try_get("date")?,
        price: row.try_get("price")?,
        created_at: row.try_get("createdAt")?,
        updated_at: row.try_get("updatedAt")?,
    })
}

fn author_from_row(row: &SqliteRow) -> Result<Author, sqlx::Error> {
    Ok(Author {
        id: row.try_get("id")?,
        first_name: row.try_get("firstName")?,
        last_name: row.try_get("lastName")?,
        email: row.try_get("email")?,
        birthdate: row.try_get("birthdate")?,
        created_at: row.try_get("createdAt")?,
        updated_at: row.try_get("updatedAt")?,
    })
}

// The author side of a LEFT OUTER JOIN; all columns are NULL when unmatched.
fn joined_author(row: &SqliteRow) -> Result<Option<Author>, sqlx::Error> {
    let Some(id) = row.try_get::<Option<i64>, _>("a_id")? else {
        return Ok(None);
    };
    Ok(Some(Author {
        id,
        first_name: row.try_get("a_firstName")?,
        last_name: row.try_get("a_lastName")?,
        email: row.try_get("a_email")?,
        birthdate: row.try_get("a_birthdate")?,
        created_at: row.try_get("a_createdAt")?,
        updated_at: row.try_get("a_updatedAt")?,
    }))
}

fn review_from_row(row: &SqliteRow) -> Result<Review, sqlx::Error> {
    Ok(Review {
        id: row.try_get("id")?,
        book_id: row.try_get("bookId")?,
        reviewer_id: row.try_get("reviewerId")?,
        body: row.try_get("body")?,
        created_at: row.try_get("createdAt")?,
        updated_at: row.try_get("updatedAt")?,
    })
}
