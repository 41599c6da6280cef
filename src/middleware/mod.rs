//! Middleware applied around the router.
//!
//! - `security_headers`: hardening and cache headers on every response
//! - `validation`: early rejection of traversal attempts and oversized bodies

pub mod security_headers;
pub mod validation;
