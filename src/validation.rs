//! Field-level validation of request input.
//!
//! Each validator checks every field of its schema in declaration order and
//! collects one message per failing field, so a client sees all problems with
//! its input at once. On success the validator hands back the typed, trimmed
//! value so handlers never touch raw JSON again.

use std::error::Error;
use std::fmt;

use serde_json::{Map, Value};

use crate::models::Book;
use crate::pagination::PageRequest;

/// A schema validation failure carrying the messages of every failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub messages: Vec<String>,
}

impl ValidationError {
    pub fn new(messages: Vec<String>) -> Self {
        ValidationError { messages }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema validation failed: {}", self.messages.join(", "))
    }
}

impl Error for ValidationError {}

/// How a field is introduced in messages, depending on where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Body,
    Query,
    Param,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Body => write!(f, "Campo"),
            Label::Query => write!(f, "Query"),
            Label::Param => write!(f, "Parâmetro"),
        }
    }
}

struct Checks<'a> {
    label: Label,
    fields: Option<&'a Map<String, Value>>,
    messages: Vec<String>,
}

impl<'a> Checks<'a> {
    fn new(label: Label, target: &'a Value) -> Self {
        Checks {
            label,
            fields: target.as_object(),
            messages: Vec::new(),
        }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields
            .and_then(|fields| fields.get(field))
            .filter(|value| !value.is_null())
    }

    fn record<T>(&mut self, field: &str, outcome: Result<T, &str>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(rule) => {
                self.messages.push(format!("{} {field} {rule}", self.label));
                None
            }
        }
    }

    /// Required, numeric, integral and >= 0.
    fn non_negative_integer(&mut self, field: &str) -> Option<i64> {
        let outcome = match self.get(field) {
            None => Err("é obrigatório"),
            Some(value) => match coerce_number(value) {
                None => Err("deve ser um número"),
                Some(number) if number < 0.0 => Err("deve ser maior ou igual à zero"),
                Some(number) => integral(number).ok_or("deve ser um número inteiro"),
            },
        };
        self.record(field, outcome)
    }

    /// Optional, but when present numeric, integral and > 0.
    fn optional_positive_integer(&mut self, field: &str) -> Option<Option<i64>> {
        let outcome = match self.get(field) {
            None => Ok(None),
            Some(value) => match coerce_number(value) {
                None => Err("deve ser um número"),
                Some(number) if number <= 0.0 => Err("deve ser um valor maior que zero"),
                Some(number) => integral(number).map(Some).ok_or("deve ser um número inteiro"),
            },
        };
        self.record(field, outcome)
    }

    /// Required and non-empty once trimmed.
    fn required_text(&mut self, field: &str) -> Option<String> {
        let outcome = match self.get(field).map(coerce_text) {
            None => Err("é obrigatório"),
            Some(None) => Err("deve ser um texto"),
            Some(Some(text)) if text.is_empty() => Err("é obrigatório"),
            Some(Some(text)) => Ok(text),
        };
        self.record(field, outcome)
    }

    fn into_error(self) -> ValidationError {
        ValidationError::new(self.messages)
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            text.parse::<f64>().ok().filter(|number| number.is_finite())
        }
        _ => None,
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn integral(number: f64) -> Option<i64> {
    // i64::MAX is not representable as f64, so the upper bound is exclusive.
    let in_range = number >= i64::MIN as f64 && number < i64::MAX as f64;
    (number.fract() == 0.0 && in_range).then_some(number as i64)
}

/// Validates a full book body. Used for both insertion and edition.
pub fn is_valid_body(body: &Value) -> Result<Book, ValidationError> {
    let mut checks = Checks::new(Label::Body, body);

    let isbn = checks.non_negative_integer("isbn");
    let name = checks.required_text("name");
    let description = checks.required_text("description");
    let author = checks.required_text("author");
    let stock = checks.non_negative_integer("stock");

    match (isbn, name, description, author, stock) {
        (Some(isbn), Some(name), Some(description), Some(author), Some(stock)) => Ok(Book {
            isbn,
            name,
            description,
            author,
            stock,
        }),
        _ => Err(checks.into_error()),
    }
}

/// Validates `page` and `size`, filling in defaults for whichever is absent.
pub fn is_valid_pagination_query(query: &Value) -> Result<PageRequest, ValidationError> {
    let mut checks = Checks::new(Label::Query, query);

    let page = checks.optional_positive_integer("page");
    let size = checks.optional_positive_integer("size");

    match (page, size) {
        (Some(page), Some(size)) => {
            let defaults = PageRequest::default();
            Ok(PageRequest::new(
                page.unwrap_or(defaults.page),
                size.unwrap_or(defaults.size),
            ))
        }
        _ => Err(checks.into_error()),
    }
}

pub fn is_valid_isbn_param(isbn: &str) -> Result<i64, ValidationError> {
    let param = Value::Object(Map::from_iter([(
        "isbn".to_string(),
        Value::String(isbn.to_string()),
    )]));
    let mut checks = Checks::new(Label::Param, &param);

    checks
        .non_negative_integer("isbn")
        .ok_or_else(|| checks.into_error())
}

pub fn is_valid_name_param(name: &str) -> Result<String, ValidationError> {
    let param = Value::Object(Map::from_iter([(
        "name".to_string(),
        Value::String(name.to_string()),
    )]));
    let mut checks = Checks::new(Label::Param, &param);

    checks
        .required_text("name")
        .ok_or_else(|| checks.into_error())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "isbn": 123456789,
            "name": "Sample Book",
            "description": "Sample Description",
            "author": "John Doe",
            "stock": 10
        })
    }

    fn body_with(field: &str, value: Value) -> Value {
        let mut body = valid_body();
        body[field] = value;
        body
    }

    fn body_without(field: &str) -> Value {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove(field);
        body
    }

    fn messages<T: fmt::Debug>(result: Result<T, ValidationError>) -> Vec<String> {
        result.unwrap_err().messages
    }

    #[test]
    fn accepts_a_complete_body() {
        let book = is_valid_body(&valid_body()).unwrap();

        assert_eq!(
            Book {
                isbn: 123456789,
                name: "Sample Book".to_string(),
                description: "Sample Description".to_string(),
                author: "John Doe".to_string(),
                stock: 10,
            },
            book
        );
    }

    #[test]
    fn empty_body_reports_every_field_in_order() {
        assert_eq!(
            vec![
                "Campo isbn é obrigatório",
                "Campo name é obrigatório",
                "Campo description é obrigatório",
                "Campo author é obrigatório",
                "Campo stock é obrigatório",
            ],
            messages(is_valid_body(&json!({})))
        );
    }

    #[test]
    fn missing_body_is_treated_as_empty() {
        assert_eq!(5, messages(is_valid_body(&Value::Null)).len());
    }

    #[test]
    fn missing_isbn_is_required() {
        assert_eq!(
            vec!["Campo isbn é obrigatório"],
            messages(is_valid_body(&body_without("isbn")))
        );
    }

    #[test]
    fn empty_isbn_is_not_a_number() {
        assert_eq!(
            vec!["Campo isbn deve ser um número"],
            messages(is_valid_body(&body_with("isbn", json!(""))))
        );
    }

    #[test]
    fn negative_isbn_is_rejected() {
        assert_eq!(
            vec!["Campo isbn deve ser maior ou igual à zero"],
            messages(is_valid_body(&body_with("isbn", json!(-1))))
        );
    }

    #[test]
    fn fractional_isbn_is_rejected() {
        assert_eq!(
            vec!["Campo isbn deve ser um número inteiro"],
            messages(is_valid_body(&body_with("isbn", json!(1.5))))
        );
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let book = is_valid_body(&body_with("stock", json!(" 12 "))).unwrap();

        assert_eq!(12, book.stock);
    }

    #[test]
    fn blank_text_fields_are_required() {
        for field in ["name", "description", "author"] {
            for value in [json!(""), json!("  ")] {
                assert_eq!(
                    vec![format!("Campo {field} é obrigatório")],
                    messages(is_valid_body(&body_with(field, value)))
                );
            }
        }
    }

    #[test]
    fn text_fields_are_trimmed() {
        let book = is_valid_body(&body_with("author", json!("  Jane Roe "))).unwrap();

        assert_eq!("Jane Roe", book.author);
    }

    #[test]
    fn structured_text_field_is_rejected() {
        assert_eq!(
            vec!["Campo name deve ser um texto"],
            messages(is_valid_body(&body_with("name", json!(["a"]))))
        );
    }

    #[test]
    fn empty_and_negative_stock() {
        assert_eq!(
            vec!["Campo stock deve ser um número"],
            messages(is_valid_body(&body_with("stock", json!(""))))
        );
        assert_eq!(
            vec!["Campo stock deve ser maior ou igual à zero"],
            messages(is_valid_body(&body_with("stock", json!(-10))))
        );
    }

    #[test]
    fn several_failures_are_collected() {
        let body = json!({ "isbn": "abc", "name": "ok", "description": " ", "author": "x", "stock": -1 });

        assert_eq!(
            vec![
                "Campo isbn deve ser um número",
                "Campo description é obrigatório",
                "Campo stock deve ser maior ou igual à zero",
            ],
            messages(is_valid_body(&body))
        );
    }

    #[test]
    fn pagination_defaults_when_absent() {
        assert_eq!(
            PageRequest::new(1, 5),
            is_valid_pagination_query(&json!({})).unwrap()
        );
        assert_eq!(
            PageRequest::new(2, 5),
            is_valid_pagination_query(&json!({ "page": "2" })).unwrap()
        );
    }

    #[test]
    fn pagination_accepts_positive_numbers() {
        assert_eq!(
            PageRequest::new(1, 10),
            is_valid_pagination_query(&json!({ "page": 1, "size": 10 })).unwrap()
        );
    }

    #[test]
    fn pagination_rejects_empty_values() {
        assert_eq!(
            vec!["Query page deve ser um número", "Query size deve ser um número"],
            messages(is_valid_pagination_query(&json!({ "page": "", "size": "" })))
        );
        assert_eq!(
            vec!["Query size deve ser um número"],
            messages(is_valid_pagination_query(&json!({ "page": 1, "size": "b" })))
        );
    }

    #[test]
    fn pagination_rejects_zero_and_negative_values() {
        assert_eq!(
            vec![
                "Query page deve ser um valor maior que zero",
                "Query size deve ser um valor maior que zero",
            ],
            messages(is_valid_pagination_query(&json!({ "page": 0, "size": -10 })))
        );
        assert_eq!(
            vec!["Query page deve ser um valor maior que zero"],
            messages(is_valid_pagination_query(&json!({ "page": "-1", "size": 10 })))
        );
    }

    #[test]
    fn isbn_param() {
        assert_eq!(123, is_valid_isbn_param("123").unwrap());
        assert_eq!(
            vec!["Parâmetro isbn deve ser um número"],
            messages(is_valid_isbn_param("abc"))
        );
        assert_eq!(
            vec!["Parâmetro isbn deve ser maior ou igual à zero"],
            messages(is_valid_isbn_param("-1"))
        );
    }

    #[test]
    fn name_param() {
        assert_eq!("Livro teste", is_valid_name_param(" Livro teste ").unwrap());
        assert_eq!("1948", is_valid_name_param("1948").unwrap());
        assert_eq!(
            vec!["Parâmetro name é obrigatório"],
            messages(is_valid_name_param("  "))
        );
    }
}
