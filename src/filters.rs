//! Typed filters that the route handlers build from query strings and the
//! store turns into SQL predicates.
//!
//! Every value is bound as a parameter; column names come from constants here
//! and never from the request.

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

use crate::error::{AppError, AppResult};

/// Raw query string of `GET /books`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookListQuery {
    #[serde(default)]
    pub max_price: Option<String>,
}

/// Raw query string of `GET /reviews`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Selects books by price.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    /// Inclusive upper bound on `Books.price`.
    pub max_price: Option<f64>,
}

impl BookFilter {
    /// Builds the filter from the raw query.
    ///
    /// A blank `maxPrice` means no bound. In strict mode anything that is not a
    /// finite number is rejected; in lenient mode the value is read like
    /// JavaScript `parseInt` and an unreadable value means no bound.
    pub fn from_query(query: &BookListQuery, lenient: bool) -> AppResult<Self> {
        let raw = match query.max_price.as_deref().map(str::trim) {
            None | Some("") => return Ok(Self::default()),
            Some(raw) => raw,
        };

        if lenient {
            return Ok(Self { max_price: parse_int_prefix(raw).map(|v| v as f64) });
        }

        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Self { max_price: Some(v) }),
            _ => Err(AppError::InvalidInput(format!("maxPrice must be a number, got '{}'", raw))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max_price.is_none()
    }

    /// Appends ` WHERE ...` for this filter, or nothing when it is empty.
    /// `books` is the alias of the `Books` table in the surrounding query.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>, books: &str) {
        let mut clause = Clause::new();
        if let Some(max) = self.max_price {
            clause.next(qb).push(format!("{}.\"price\" <= ", books)).push_bind(max);
        }
    }
}

/// Selects reviews by their reviewer's name. Present fields are ANDed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewerFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl ReviewerFilter {
    pub fn from_query(query: &ReviewQuery) -> Self {
        Self { first_name: non_blank(&query.first_name), last_name: non_blank(&query.last_name) }
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none()
    }

    /// Appends ` WHERE ...` for this filter, or nothing when it is empty.
    /// `reviewers` is the alias of the `Reviewers` table in the surrounding query.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>, reviewers: &str) {
        let mut clause = Clause::new();
        if let Some(first) = &self.first_name {
            clause.next(qb).push(format!("{}.\"firstName\" = ", reviewers)).push_bind(first.clone());
        }
        if let Some(last) = &self.last_name {
            clause.next(qb).push(format!("{}.\"lastName\" = ", reviewers)).push_bind(last.clone());
        }
    }
}

/// Emits `WHERE` before the first predicate and `AND` before the rest.
struct Clause {
    started: bool,
}

impl Clause {
    fn new() -> Self {
        Self { started: false }
    }

    fn next<'q, 'a>(&mut self, qb: &'q mut QueryBuilder<'a, Sqlite>) -> &'q mut QueryBuilder<'a, Sqlite> {
        let keyword = if self.started { " AND " } else { " WHERE " };
        self.started = true;
        qb.push(keyword)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Leading optional sign followed by digits, as `parseInt(s)` reads it without
/// a radix: a `0x`/`0X` prefix switches to hexadecimal, anything else is decimal.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, digits) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        _ => (10, rest),
    };
    let end = digits.bytes().take_while(|b| (*b as char).is_digit(radix)).count();
    if end == 0 {
        return None;
    }
    let value = i64::from_str_radix(&digits[..end], radix).ok()?;
    Some(if negative { -value } else { value })
}
