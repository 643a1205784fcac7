use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};

/// Application error taxonomy. Every service operation fails with exactly one
/// of these variants, and the HTTP boundary maps each to a status code and a
/// JSON body with an `error` field.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or out-of-range input.
    Validation(String),
    /// Entity-level validation failures, surfaced as a `details` array.
    ValidationDetails(Vec<String>),
    /// Required fields absent from a submission, surfaced as a
    /// `missingFields` map.
    MissingFields(Vec<&'static str>),
    /// Uniqueness conflict on create or update.
    AlreadyExists(String),
    /// Unknown email or password mismatch on login. Both cases produce the
    /// same generic body so callers cannot probe which check failed.
    InvalidCredentials,
    /// Malformed identifier in the request path.
    InvalidId,
    NotFound(String),
    /// No bearer token, or the token resolved to a nonexistent admin.
    Unauthenticated(String),
    /// Bad signature or malformed token.
    InvalidToken,
    ExpiredToken,
    /// Unexpected failure. Detail is logged but only echoed to the client in
    /// development mode.
    Internal(anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Internal(err.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::ValidationDetails(_)
            | Self::MissingFields(_)
            | Self::AlreadyExists(_)
            | Self::InvalidId => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidCredentials
            | Self::Unauthenticated(_)
            | Self::InvalidToken
            | Self::ExpiredToken => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::Validation(msg) => json!({ "error": msg }),
            Self::ValidationDetails(details) => {
                json!({ "error": "Validation failed", "details": details })
            }
            Self::MissingFields(fields) => {
                let map: Map<String, Value> = fields
                    .iter()
                    .map(|field| (field.to_string(), Value::Bool(true)))
                    .collect();
                json!({ "error": "All fields are required", "missingFields": map })
            }
            Self::AlreadyExists(msg) => json!({ "error": msg }),
            Self::InvalidCredentials => json!({ "error": "Invalid credentials" }),
            Self::InvalidId => json!({ "error": "Invalid student ID" }),
            Self::NotFound(msg) => json!({ "error": msg }),
            Self::Unauthenticated(msg) => json!({ "error": msg }),
            Self::InvalidToken => json!({ "error": "Invalid token." }),
            Self::ExpiredToken => json!({ "error": "Token expired." }),
            Self::Internal(err) => {
                if development_mode() {
                    json!({ "error": "Internal server error", "details": err.to_string() })
                } else {
                    json!({ "error": "Internal server error" })
                }
            }
        }
    }
}

fn development_mode() -> bool {
    std::env::var("APP_ENV").is_ok_and(|env| env == "development")
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(msg) | Self::AlreadyExists(msg) => write!(f, "{}", msg),
            Self::ValidationDetails(details) => {
                write!(f, "Validation failed: {}", details.join(", "))
            }
            Self::MissingFields(fields) => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            Self::InvalidCredentials => write!(f, "Invalid credentials"),
            Self::InvalidId => write!(f, "Invalid student ID"),
            Self::NotFound(msg) | Self::Unauthenticated(msg) => write!(f, "{}", msg),
            Self::InvalidToken => write!(f, "Invalid token"),
            Self::ExpiredToken => write!(f, "Token expired"),
            Self::Internal(err) => write!(f, "{}", err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            tracing::error!(error = %err, "Unhandled internal error");
        }
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}
