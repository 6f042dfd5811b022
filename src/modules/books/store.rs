//! SQL accessor for the `books` table.

use sqlx::SqlitePool;
use thiserror::Error;

use super::models::{Book, BookPatch};

#[derive(Debug, Error)]
pub enum BookError {
    #[error("no book with isbn '{0}'")]
    NotFound(String),

    #[error("a book with isbn '{0}' already exists")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Handle to the book table; cloning shares the underlying pool.
#[derive(Debug, Clone)]
pub struct BookStore {
    pool: SqlitePool,
}

impl BookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new book. The primary key decides duplicates, so two racing
    /// inserts for one ISBN end with exactly one `Conflict`.
    pub async fn create(&self, book: &Book) -> Result<Book, BookError> {
        let created = sqlx::query_as::<_, Book>(
            "INSERT INTO books (isbn, amazon_url, author, language, pages, publisher, title, year)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING isbn, amazon_url, author, language, pages, publisher, title, year",
        )
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                BookError::Conflict(book.isbn.clone())
            }
            other => BookError::Database(other),
        })?;

        tracing::debug!(isbn = %created.isbn, "book created");
        Ok(created)
    }

    /// All books in insertion order.
    pub async fn find_all(&self) -> Result<Vec<Book>, BookError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT isbn, amazon_url, author, language, pages, publisher, title, year
             FROM books
             ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    pub async fn find_one(&self, isbn: &str) -> Result<Book, BookError> {
        sqlx::query_as::<_, Book>(
            "SELECT isbn, amazon_url, author, language, pages, publisher, title, year
             FROM books
             WHERE isbn = ?",
        )
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BookError::NotFound(isbn.to_string()))
    }

    /// Merge `patch` into the stored row and return the result.
    ///
    /// Runs as one statement; columns without a patched value keep theirs.
    pub async fn update(&self, isbn: &str, patch: &BookPatch) -> Result<Book, BookError> {
        let updated = sqlx::query_as::<_, Book>(
            "UPDATE books SET
                 amazon_url = COALESCE(?, amazon_url),
                 author = COALESCE(?, author),
                 language = COALESCE(?, language),
                 pages = COALESCE(?, pages),
                 publisher = COALESCE(?, publisher),
                 title = COALESCE(?, title),
                 year = COALESCE(?, year)
             WHERE isbn = ?
             RETURNING isbn, amazon_url, author, language, pages, publisher, title, year",
        )
        .bind(&patch.amazon_url)
        .bind(&patch.author)
        .bind(&patch.language)
        .bind(patch.pages)
        .bind(&patch.publisher)
        .bind(&patch.title)
        .bind(patch.year)
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BookError::NotFound(isbn.to_string()))?;

        tracing::debug!(isbn = %isbn, empty_patch = patch.is_empty(), "book updated");
        Ok(updated)
    }

    pub async fn remove(&self, isbn: &str) -> Result<(), BookError> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = ?")
            .bind(isbn)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BookError::NotFound(isbn.to_string()));
        }

        tracing::debug!(isbn = %isbn, "book removed");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, BookError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::SCHEMA;

    async fn store() -> BookStore {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::raw_sql(SCHEMA).execute(&pool).await.unwrap();
        BookStore::new(pool)
    }

    fn power_up() -> Book {
        Book {
            isbn: "069161518".to_string(),
            amazon_url: "http://a.co/eobPtX2".to_string(),
            author: "Matthew Lane".to_string(),
            language: "english".to_string(),
            pages: 264,
            publisher: "Princeton University Press".to_string(),
            title: "Power-Up: Unlocking the Hidden Mathematics in Video Games".to_string(),
            year: 2017,
        }
    }

    fn super_up() -> Book {
        Book {
            isbn: "069161519".to_string(),
            amazon_url: "http://a.co/eobPtX1".to_string(),
            author: "Biggs Lewis".to_string(),
            language: "english".to_string(),
            pages: 102,
            publisher: "Bellhouse Publishing".to_string(),
            title: "Super Up Your Game".to_string(),
            year: 2017,
        }
    }

    #[tokio::test]
    async fn create_then_find_one_round_trips() {
        let store = store().await;
        let created = store.create(&power_up()).await.unwrap();
        assert_eq!(created, power_up());
        assert_eq!(store.find_one("069161518").await.unwrap(), power_up());
    }

    #[tokio::test]
    async fn duplicate_isbn_is_a_conflict() {
        let store = store().await;
        store.create(&power_up()).await.unwrap();

        let mut again = super_up();
        again.isbn = power_up().isbn;
        let err = store.create(&again).await.unwrap_err();
        assert!(matches!(err, BookError::Conflict(ref isbn) if isbn == "069161518"));

        // The stored row is the first one.
        assert_eq!(store.find_one("069161518").await.unwrap(), power_up());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn racing_creates_on_two_connections_yield_one_conflict() {
        let path = std::env::temp_dir().join(format!(
            "biblio-race-{}-{}.db",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let options = sqlx::sqlite::SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .min_connections(2)
            .max_connections(2)
            .connect_with(options)
            .await
            .unwrap();
        sqlx::raw_sql(SCHEMA).execute(&pool).await.unwrap();
        let store = BookStore::new(pool.clone());

        let first = store.clone();
        let second = store.clone();
        let (a, b) = tokio::join!(
            tokio::spawn(async move { first.create(&power_up()).await }),
            tokio::spawn(async move { second.create(&power_up()).await }),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        let conflicts = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(BookError::Conflict(_))))
            .count();
        assert_eq!(conflicts, 1);
        assert!(a.is_ok() || b.is_ok());
        assert_eq!(store.count().await.unwrap(), 1);

        pool.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let store = store().await;
        assert!(store.find_all().await.unwrap().is_empty());

        store.create(&super_up()).await.unwrap();
        store.create(&power_up()).await.unwrap();

        let isbns: Vec<String> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.isbn)
            .collect();
        assert_eq!(isbns, vec!["069161519", "069161518"]);
    }

    #[tokio::test]
    async fn find_one_missing_is_not_found() {
        let store = store().await;
        let err = store.find_one("0").await.unwrap_err();
        assert!(matches!(err, BookError::NotFound(ref isbn) if isbn == "0"));
    }

    #[tokio::test]
    async fn update_merges_given_fields_only() {
        let store = store().await;
        store.create(&power_up()).await.unwrap();

        let patch = BookPatch {
            pages: Some(500),
            title: Some("Power-Up (2nd ed.)".to_string()),
            ..BookPatch::default()
        };
        let updated = store.update("069161518", &patch).await.unwrap();

        let expected = Book {
            pages: 500,
            title: "Power-Up (2nd ed.)".to_string(),
            ..power_up()
        };
        assert_eq!(updated, expected);
        assert_eq!(store.find_one("069161518").await.unwrap(), expected);
    }

    #[tokio::test]
    async fn empty_update_returns_stored_row() {
        let store = store().await;
        store.create(&power_up()).await.unwrap();

        let updated = store
            .update("069161518", &BookPatch::default())
            .await
            .unwrap();
        assert_eq!(updated, power_up());
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = store().await;
        let err = store
            .update("0", &BookPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BookError::NotFound(_)));
    }

    #[tokio::test]
    async fn remove_deletes_once() {
        let store = store().await;
        store.create(&power_up()).await.unwrap();

        store.remove("069161518").await.unwrap();
        assert!(matches!(
            store.find_one("069161518").await,
            Err(BookError::NotFound(_))
        ));
        assert!(matches!(
            store.remove("069161518").await,
            Err(BookError::NotFound(_))
        ));
    }
}
