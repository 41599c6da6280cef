use serde::{Deserialize, Serialize};

// Records as stored; field names match the column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub birthdate: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub price: f64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub book_id: i64,
    pub reviewer_id: i64,
    pub body: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// Embedded associations are keyed by model name ("Author", "Reviewer", ...).

/// `GET /books` item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookWithAuthor {
    #[serde(flatten)]
    pub book: Book,
    #[serde(rename = "Author")]
    pub author: Option<Author>,
}

/// The reviewer projection embedded in `GET /reviews`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerName {
    pub first_name: String,
    pub last_name: String,
}

/// `GET /reviews` item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewWithReviewer {
    #[serde(flatten)]
    pub review: Review,
    #[serde(rename = "Reviewer")]
    pub reviewer: ReviewerName,
}

/// `GET /test-benchmark-logging` item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    #[serde(rename = "Author")]
    pub author: Option<Author>,
    #[serde(rename = "Reviews")]
    pub reviews: Vec<Review>,
    #[serde(rename = "Reviewers")]
    pub reviewers: Vec<Reviewer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePriceRequest {
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePriceResponse {
    pub message: String,
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
