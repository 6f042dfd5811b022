use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::get,
    Json, Router,
};
use biblio_http::error::AppError;
use serde_json::Value;

use super::models::{BookListResponse, BookResponse, MessageResponse};
use super::store::{BookError, BookStore};
use super::validation::{self, FieldError};

/// Book routes, served both with and without the trailing slash on the
/// collection path.
pub fn router(store: BookStore) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/", get(list_books).post(create_book))
        .route(
            "/books/{isbn}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(store)
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::NotFound(_) => AppError::not_found(err.to_string()),
            BookError::Conflict(ref isbn) => AppError::conflict(
                vec![serde_json::json!({"field": "isbn", "error": "already exists", "value": isbn})],
                err.to_string(),
            ),
            BookError::Database(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

fn invalid_book(errors: Vec<FieldError>) -> AppError {
    let message = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    let details = errors
        .into_iter()
        .map(|e| serde_json::json!({"field": e.field, "error": e.error}))
        .collect();
    AppError::validation(details, message)
}

/// GET /books/
async fn list_books(State(store): State<BookStore>) -> Result<Json<BookListResponse>, AppError> {
    let books = store.find_all().await?;
    Ok(Json(BookListResponse { books }))
}

/// GET /books/{isbn}
async fn get_book(
    State(store): State<BookStore>,
    isbn: Result<Path<String>, PathRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let Path(isbn) = isbn?;
    let book = store.find_one(&isbn).await?;
    Ok(Json(BookResponse { book }))
}

/// POST /books/
///
/// Answers 200 rather than 201; existing clients expect it.
async fn create_book(
    State(store): State<BookStore>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let Json(input) = payload?;
    let book = validation::validate_new_book(&input).map_err(invalid_book)?;
    let book = store.create(&book).await?;
    Ok(Json(BookResponse { book }))
}

/// PUT /books/{isbn}
async fn update_book(
    State(store): State<BookStore>,
    isbn: Result<Path<String>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let Path(isbn) = isbn?;
    let Json(input) = payload?;
    let patch = validation::validate_book_patch(&isbn, &input).map_err(invalid_book)?;
    let book = store.update(&isbn, &patch).await?;
    Ok(Json(BookResponse { book }))
}

/// DELETE /books/{isbn}
async fn delete_book(
    State(store): State<BookStore>,
    isbn: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(isbn) = isbn?;
    store.remove(&isbn).await?;
    Ok(Json(MessageResponse {
        message: "Book deleted",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn store_errors_map_to_statuses() {
        let not_found: AppError = BookError::NotFound("0".to_string()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let conflict: AppError = BookError::Conflict("069161518".to_string()).into();
        assert_eq!(conflict.status(), StatusCode::BAD_REQUEST);

        let internal: AppError = BookError::Database(sqlx::Error::PoolClosed).into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_errors_are_joined() {
        let errors = validation::validate_new_book(&serde_json::json!({
            "isbn": "1",
            "amazon_url": "hello",
            "author": "a",
            "language": "english",
            "pages": "102",
            "publisher": "p",
            "title": "t",
            "year": 2017
        }))
        .unwrap_err();

        match invalid_book(errors) {
            AppError::Validation {
                details, message, ..
            } => {
                assert_eq!(message, "amazon_url must be a valid URL; pages must be an integer");
                assert_eq!(details.len(), 2);
                assert_eq!(details[1]["field"], "pages");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
