//! Integration and unit tests for the Bookbench backend.
//!
//! ## Test Modules
//!
//! - **support**: on-disk test database, fixture rows and request helpers
//! - **books_api_tests**: `/books` and both `/authors/{id}/books` routes
//! - **reviews_api_tests**: `/reviews` filtering
//! - **health_api_tests**: root, probes, metrics, version and middleware
//! - **store_tests**: transaction behaviour of the bulk price update
//! - **filter_tests**: query string parsing and SQL predicate building
//! - **db_tests**: schema, foreign keys, migrations and index usage
//! - **config_tests**: configuration loading and validation
//! - **error_tests**: error mapping and response bodies
//!
//! Run everything with `cargo test`, or one module with e.g. `cargo test books_api_tests`.

pub mod support;

pub mod config_tests;
