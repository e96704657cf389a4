use std::error::Error;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use tracing::{error, warn};

use crate::validation::ValidationError;

pub const SCHEMA_VALIDATE_FAIL: &str = "SCHEMA_VALIDATE_FAIL";
pub const UNIQUE_VIOLATION: &str = "UNIQUE_VIOLATION";

const UNKNOWN_LOCATION: &str = "Local desconhecido";
const INVALID_FIELDS: &str = "Campos inválidos";
const INTERNAL_SERVER_ERROR: &str = "Internal server error";

/// Every failure a request can end in. Each variant maps to exactly one status:
/// validation to 400, conflict to 409, anything else to 500.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    Validation(ValidationError),
    /// A uniqueness violation reported by the store. `fields` holds whatever the
    /// store said about it, and is sent back to the client untouched.
    Conflict {
        message: String,
        fields: Map<String, Value>,
    },
    Internal {
        message: Option<String>,
        fields: Map<String, Value>,
    },
}

impl AppError {
    /// Builds the client-visible response for this error, naming `location` as
    /// the place the request failed.
    pub fn into_response_at(self, location: Option<&str>) -> Response {
        let location = location.unwrap_or(UNKNOWN_LOCATION);

        match self {
            AppError::Validation(validation) => {
                let detail = if validation.messages.is_empty() {
                    INVALID_FIELDS.to_string()
                } else {
                    validation.messages.join(",")
                };
                let message = format!("{location} :: {detail}");
                warn!(code = SCHEMA_VALIDATE_FAIL, "{}", message);

                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            AppError::Conflict {
                message,
                mut fields,
            } => {
                warn!(code = UNIQUE_VIOLATION, location, "{}", message);
                fields.insert("code".to_string(), Value::from(UNIQUE_VIOLATION));
                fields.insert("message".to_string(), Value::from(message));

                (StatusCode::CONFLICT, Json(Value::Object(fields))).into_response()
            }
            AppError::Internal {
                message,
                mut fields,
            } => {
                let message = message.unwrap_or_else(|| INTERNAL_SERVER_ERROR.to_string());
                error!(location, ?fields, "{}", message);
                fields.insert("message".to_string(), Value::from(message));

                (StatusCode::INTERNAL_SERVER_ERROR, Json(Value::Object(fields))).into_response()
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        AppError::Validation(error)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{e}"),
            AppError::Conflict { message, .. } => write!(f, "conflict: {message}"),
            AppError::Internal { message, .. } => write!(
                f,
                "internal error: {}",
                message.as_deref().unwrap_or(INTERNAL_SERVER_ERROR)
            ),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_at(None)
    }
}
