use serde::{Deserialize, Serialize};

/// A catalogued book, keyed by ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Unique identifier for the book
    pub isbn: String,
    /// Product page on Amazon
    pub amazon_url: String,
    /// Author of the book
    pub author: String,
    /// Language the book is written in
    pub language: String,
    /// Page count
    pub pages: i64,
    /// Publishing house
    pub publisher: String,
    /// Title of the book
    pub title: String,
    /// Year of publication
    pub year: i64,
}

/// Partial update for an existing book; `None` keeps the stored value.
///
/// The ISBN is the key of the record and cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookPatch {
    pub amazon_url: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub pages: Option<i64>,
    pub publisher: Option<String>,
    pub title: Option<String>,
    pub year: Option<i64>,
}

impl BookPatch {
    /// Whether applying this patch would leave a record untouched.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// `{"book": {...}}`
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub book: Book,
}

/// `{"books": [...]}`
#[derive(Debug, Serialize)]
pub struct BookListResponse {
    pub books: Vec<Book>,
}

/// `{"message": "..."}`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
