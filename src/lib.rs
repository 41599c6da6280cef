//! # Bookbench Backend Library
//!
//! A JSON API over Authors, Books, Reviewers and Reviews stored in SQLite.
//! Route handlers turn query strings into typed filters; the store turns those
//! filters into bound SQL predicates so filtering happens in the database and
//! can use the indexes added by the migrations.
//!
//! ## Architecture
//!
//! - **Axum**: HTTP server and routing
//! - **SQLx**: asynchronous SQLite access and transactions
//! - **Tokio**: async runtime
//! - **Serde**: JSON (de)serialization
//!
//! ## Core Components
//!
//! - [`config`]: layered configuration (embedded defaults, file, environment)
//! - [`db`]: pool setup, base schema and query timing
//! - [`migrations`]: reversible index migrations
//! - [`error`]: error type and its JSON responses
//! - [`filters`]: typed book and reviewer filters
//! - [`store`]: persistence layer used by the handlers
//! - [`routes`]: HTTP handlers and router construction
//! - [`middleware`]: security headers and request validation
//! - [`metrics`]: request and query counters
//! - [`state`]: shared application state
//! - [`types`]: records and response shapes

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod metrics;
pub mod middleware;
pub mod migrations;
pub mod routes;
pub mod state;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;
