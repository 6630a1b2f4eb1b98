// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// HTTP API error with appropriate status codes and client-facing messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request - validation failures and store-reported rejections
    BadRequest(String),

    // 401 Unauthorized - invalid or expired credentials
    Unauthorized(String),

    // 403 Forbidden - missing token, or role/ownership check failed
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        use crate::database::manager::DatabaseError;

        match err {
            DatabaseError::Sqlx(sqlx::Error::RowNotFound) => {
                ApiError::not_found("Record not found.")
            }
            // Constraint violations carry messages attributable to caller
            // input (duplicate email, broken FK); the store message passes
            // through as a 400.
            DatabaseError::Sqlx(sqlx::Error::Database(db_err)) => {
                ApiError::bad_request(db_err.message().to_string())
            }
            DatabaseError::QueryError(msg) => {
                tracing::error!("query build error: {}", msg);
                ApiError::internal("An unexpected server error occurred.")
            }
            other => {
                tracing::error!("database error: {}", other);
                ApiError::internal("An unexpected server error occurred.")
            }
        }
    }
}

impl From<crate::filter::error::FilterError> for ApiError {
    fn from(err: crate::filter::error::FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        tracing::error!("password hashing failed: {}", err);
        ApiError::internal("An unexpected server error occurred.")
    }
}

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        use crate::auth::AuthError;

        match err {
            AuthError::MissingSecret => {
                tracing::error!("JWT secret is not configured");
                ApiError::internal("An unexpected server error occurred.")
            }
            AuthError::TokenCreation(msg) => {
                tracing::error!("token creation failed: {}", msg);
                ApiError::internal("An unexpected server error occurred.")
            }
            AuthError::InvalidToken => ApiError::unauthorized("Invalid or expired token."),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Failure payloads are always `{"error": <message>}`
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
