//! Field schema for book payloads.
//!
//! Validation walks the raw JSON instead of deserializing straight into
//! [`Book`], so that every offending field is reported in one response and
//! numeric strings such as `"102"` are refused.

use std::fmt;

use axum::http::Uri;
use serde::Serialize;
use serde_json::{Map, Value};

use super::models::{Book, BookPatch};

/// Name used for errors that concern the payload as a whole.
pub const BODY_FIELD: &str = "(body)";

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    fn new(field: &str, error: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            error: error.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.error)
    }
}

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Key,
    Text,
    Integer,
    Url,
}

impl FieldKind {
    fn check(self, value: &Value) -> Result<(), &'static str> {
        match self {
            FieldKind::Key => match value.as_str() {
                Some(s) if !s.trim().is_empty() => Ok(()),
                Some(_) => Err("must not be empty"),
                None => Err("must be a string"),
            },
            FieldKind::Text => value.as_str().map(|_| ()).ok_or("must be a string"),
            FieldKind::Integer => value.as_i64().map(|_| ()).ok_or("must be an integer"),
            FieldKind::Url => {
                let text = value.as_str().ok_or("must be a string")?;
                if is_absolute_url(text) {
                    Ok(())
                } else {
                    Err("must be a valid URL")
                }
            }
        }
    }
}

const BOOK_FIELDS: [(&str, FieldKind); 8] = [
    ("isbn", FieldKind::Key),
    ("amazon_url", FieldKind::Url),
    ("author", FieldKind::Text),
    ("language", FieldKind::Text),
    ("pages", FieldKind::Integer),
    ("publisher", FieldKind::Text),
    ("title", FieldKind::Text),
    ("year", FieldKind::Integer),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Required,
    Optional,
}

fn is_absolute_url(text: &str) -> bool {
    match text.parse::<Uri>() {
        Ok(uri) => {
            uri.scheme().is_some() && uri.authority().is_some_and(|a| !a.host().is_empty())
        }
        Err(_) => false,
    }
}

/// Check every field, collecting all violations. `key` is the ISBN a body
/// `isbn` must repeat, when one is already fixed.
fn check_fields<'a>(
    input: &'a Value,
    presence: Presence,
    key: Option<&str>,
) -> Result<&'a Map<String, Value>, Vec<FieldError>> {
    let Some(object) = input.as_object() else {
        return Err(vec![FieldError::new(BODY_FIELD, "must be a JSON object")]);
    };

    let mut errors = Vec::new();
    for (name, kind) in BOOK_FIELDS {
        match (object.get(name), presence) {
            (None | Some(Value::Null), Presence::Required) => {
                errors.push(FieldError::new(name, "is required"));
            }
            (None, Presence::Optional) => {}
            (Some(Value::Null), Presence::Optional) => {
                errors.push(FieldError::new(name, "must not be null"));
            }
            (Some(value), _) => {
                if let Err(message) = kind.check(value) {
                    errors.push(FieldError::new(name, message));
                    continue;
                }
                if let (FieldKind::Key, Some(expected)) = (kind, key) {
                    if value.as_str() != Some(expected) {
                        errors.push(FieldError::new(
                            name,
                            format!("cannot be changed (expected '{}')", expected),
                        ));
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(object)
    } else {
        Err(errors)
    }
}

fn decode<T: serde::de::DeserializeOwned>(object: &Map<String, Value>) -> Result<T, Vec<FieldError>> {
    serde_json::from_value(Value::Object(object.clone()))
        .map_err(|e| vec![FieldError::new(BODY_FIELD, e.to_string())])
}

/// Validate a creation payload; all eight fields are required.
pub fn validate_new_book(input: &Value) -> Result<Book, Vec<FieldError>> {
    let object = check_fields(input, Presence::Required, None)?;
    decode(object)
}

/// Validate an update payload for the book stored under `isbn`.
///
/// Every field is optional. A body `isbn` is accepted only when it repeats
/// the key being updated.
pub fn validate_book_patch(isbn: &str, input: &Value) -> Result<BookPatch, Vec<FieldError>> {
    let object = check_fields(input, Presence::Optional, Some(isbn))?;
    decode(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "isbn": "069161519",
            "amazon_url": "http://a.co/eobPtX1",
            "author": "Biggs Lewis",
            "language": "english",
            "pages": 102,
            "publisher": "Bellhouse Publishing",
            "title": "Super Up Your Game",
            "year": 2017
        })
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn accepts_complete_book() {
        let book = validate_new_book(&valid_payload()).unwrap();
        assert_eq!(book.isbn, "069161519");
        assert_eq!(book.pages, 102);
        assert_eq!(book.year, 2017);
    }

    #[test]
    fn ignores_unknown_fields() {
        let mut payload = valid_payload();
        payload["edition"] = json!("second");
        assert!(validate_new_book(&payload).is_ok());
    }

    #[test]
    fn empty_object_reports_every_field() {
        let errors = validate_new_book(&json!({})).unwrap_err();
        assert_eq!(
            fields(&errors),
            vec!["isbn", "amazon_url", "author", "language", "pages", "publisher", "title", "year"]
        );
        assert!(errors.iter().all(|e| e.error == "is required"));
    }

    #[test]
    fn numeric_strings_are_not_integers() {
        let mut payload = valid_payload();
        payload["pages"] = json!("102");
        payload["year"] = json!("garbage");

        let errors = validate_new_book(&payload).unwrap_err();
        assert_eq!(fields(&errors), vec!["pages", "year"]);
        assert_eq!(errors[0].to_string(), "pages must be an integer");
    }

    #[test]
    fn fractional_numbers_are_not_integers() {
        let mut payload = valid_payload();
        payload["pages"] = json!(10.5);
        let errors = validate_new_book(&payload).unwrap_err();
        assert_eq!(fields(&errors), vec!["pages"]);
    }

    #[test]
    fn amazon_url_must_be_absolute() {
        for bad in ["hello", "/relative/path", "a.co/eobPtX1", "http://"] {
            let mut payload = valid_payload();
            payload["amazon_url"] = json!(bad);
            let errors = validate_new_book(&payload).unwrap_err();
            assert_eq!(fields(&errors), vec!["amazon_url"], "accepted {bad}");
        }

        let mut payload = valid_payload();
        payload["amazon_url"] = json!("https://www.amazon.com/dp/069161519?tag=x");
        assert!(validate_new_book(&payload).is_ok());
    }

    #[test]
    fn blank_isbn_is_rejected() {
        let mut payload = valid_payload();
        payload["isbn"] = json!("  ");
        let errors = validate_new_book(&payload).unwrap_err();
        assert_eq!(errors[0], FieldError::new("isbn", "must not be empty"));
    }

    #[test]
    fn null_counts_as_missing_on_create() {
        let mut payload = valid_payload();
        payload["author"] = Value::Null;
        let errors = validate_new_book(&payload).unwrap_err();
        assert_eq!(errors, vec![FieldError::new("author", "is required")]);
    }

    #[test]
    fn non_object_body_is_rejected() {
        let errors = validate_new_book(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(fields(&errors), vec![BODY_FIELD]);

        let errors = validate_book_patch("069161518", &json!("pages")).unwrap_err();
        assert_eq!(fields(&errors), vec![BODY_FIELD]);
    }

    #[test]
    fn empty_patch_is_valid() {
        let patch = validate_book_patch("069161518", &json!({})).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn patch_keeps_only_given_fields() {
        let patch = validate_book_patch("069161518", &json!({"pages": 500})).unwrap();
        assert_eq!(patch.pages, Some(500));
        assert_eq!(patch.title, None);
        assert_eq!(patch.year, None);
    }

    #[test]
    fn patch_checks_types_of_present_fields() {
        let errors = validate_book_patch(
            "069161518",
            &json!({"pages": "102", "amazon_url": "hello", "title": Value::Null}),
        )
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["amazon_url", "pages", "title"]);
    }

    #[test]
    fn patch_may_repeat_but_not_change_isbn() {
        assert!(validate_book_patch("069161518", &json!({"isbn": "069161518"})).is_ok());

        let errors = validate_book_patch("069161518", &json!({"isbn": "069161519"})).unwrap_err();
        assert_eq!(fields(&errors), vec!["isbn"]);
    }

    #[test]
    fn isbn_change_is_reported_with_other_errors() {
        let errors =
            validate_book_patch("069161518", &json!({"isbn": "999", "pages": "x"})).unwrap_err();
        assert_eq!(fields(&errors), vec!["isbn", "pages"]);
        assert_eq!(errors[0].error, "cannot be changed (expected '069161518')");
    }
}
