use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Request and query counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub books_listed: Arc<AtomicU64>,
    pub reviews_listed: Arc<AtomicU64>,
    pub price_updates: Arc<AtomicU64>,
    pub books_repriced: Arc<AtomicU64>,
    pub authors_not_found: Arc<AtomicU64>,
    pub invalid_requests: Arc<AtomicU64>,
    pub slow_queries: Arc<AtomicU64>,
    pub failed_queries: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            books_listed: Arc::new(AtomicU64::new(0)),
            reviews_listed: Arc::new(AtomicU64::new(0)),
            price_updates: Arc::new(AtomicU64::new(0)),
            books_repriced: Arc::new(AtomicU64::new(0)),
            authors_not_found: Arc::new(AtomicU64::new(0)),
            invalid_requests: Arc::new(AtomicU64::new(0)),
            slow_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn add_books_listed(&self, count: u64) {
        self.books_listed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_reviews_listed(&self, count: u64) {
        self.reviews_listed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_price_updates(&self) {
        self.price_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_books_repriced(&self, count: u64) {
        self.books_repriced.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_authors_not_found(&self) {
        self.authors_not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_invalid_requests(&self) {
        self.invalid_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_slow_queries(&self) {
        self.slow_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed_queries(&self) {
        self.failed_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            books_listed: self.books_listed.load(Ordering::Relaxed),
            reviews_listed: self.reviews_listed.load(Ordering::Relaxed),
            price_updates: self.price_updates.load(Ordering::Relaxed),
            books_repriced: self.books_repriced.load(Ordering::Relaxed),
            authors_not_found: self.authors_not_found.load(Ordering::Relaxed),
            invalid_requests: self.invalid_requests.load(Ordering::Relaxed),
            slow_queries: self.slow_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub books_listed: u64,
    pub reviews_listed: u64,
    pub price_updates: u64,
    pub books_repriced: u64,
    pub authors_not_found: u64,
    pub invalid_requests: u64,
    pub slow_queries: u64,
    pub failed_queries: u64,
    pub uptime_seconds: u64,
}
