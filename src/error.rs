/// Error Handling Module
///
/// One application error type that every handler returns. It covers:
/// 1. Domain-specific error types (validation, authentication)
/// 2. Conversion from store failures
/// 3. HTTP response mapping with structured logging
/// 4. Error context used to correlate log lines of one operation
/// 5. Extractor error handlers, so malformed requests share the same body

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, ResponseError},
    http::StatusCode,
    HttpRequest, HttpResponse,
};

use crate::store::StoreError;

// ============================================================================
// 1. DOMAIN-SPECIFIC ERROR TYPES
// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(&'static str),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(&'static str, usize),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(&'static str, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(&'static str),
    #[error("{0} contains suspicious content")]
    SuspiciousContent(&'static str),
    #[error("{0} is out of range")]
    OutOfRange(&'static str),
    #[error("passwords do not match")]
    PasswordMismatch,
    /// The request could not be decoded at all; the decoder's message is
    /// only logged
    #[error("{0} is malformed")]
    Malformed(&'static str),
}

/// Authentication and authorization failures.
///
/// Everything here maps to `401 Unauthorized` except
/// [`AuthError::InvalidRefreshToken`], which maps to `403 Forbidden` so a
/// client can tell "never logged in" apart from "session is over".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Access token not found")]
    MissingToken,
    #[error("Invalid access token")]
    InvalidAccessToken,
    #[error("Account not found")]
    AccountNotFound,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
}

// ============================================================================
// 2. UNIFIED APPLICATION ERROR TYPE
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(field) => {
                AppError::Conflict(format!("{} is already registered", field))
            }
            StoreError::Backend(msg) => AppError::Database(msg),
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID, also present in the log line for this failure
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    /// Machine-readable code and client-safe message.
    ///
    /// Database and internal details stay in the logs.
    fn code_and_message(&self) -> (&'static str, String) {
        match self {
            AppError::Validation(e) => ("VALIDATION_ERROR", e.to_string()),
            AppError::Auth(e) => {
                let code = match e {
                    AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
                    AuthError::MissingToken => "UNAUTHORIZED",
                    AuthError::InvalidAccessToken => "TOKEN_INVALID",
                    AuthError::AccountNotFound => "ACCOUNT_NOT_FOUND",
                    AuthError::InvalidRefreshToken => "REFRESH_TOKEN_INVALID",
                };
                (code, e.to_string())
            }
            AppError::Conflict(msg) => ("CONFLICT", msg.clone()),
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::Database(_) => ("DATABASE_ERROR", "Database error occurred".to_string()),
            AppError::Internal(_) => ("INTERNAL_ERROR", "Internal server error".to_string()),
        }
    }

    fn log_error(&self, error_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Validation error");
            }
            AppError::Auth(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Authentication error");
            }
            AppError::Conflict(msg) => {
                tracing::warn!(error_id = error_id, error = %msg, "Duplicate entry attempt");
            }
            AppError::NotFound(msg) => {
                tracing::debug!(error_id = error_id, error = %msg, "Resource not found");
            }
            AppError::Database(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Database error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::InvalidRefreshToken) => StatusCode::FORBIDDEN,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let status = self.status_code();
        let (code, message) = self.code_and_message();
        HttpResponse::build(status).json(ErrorResponse::new(
            error_id,
            message,
            code.to_string(),
            status.as_u16(),
        ))
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Correlates the log lines emitted while serving one operation.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub account_id: Option<String>,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            account_id: None,
            operation: operation.into(),
        }
    }

    pub fn with_account_id(mut self, account_id: impl ToString) -> Self {
        self.account_id = Some(account_id.to_string());
        self
    }
}

// ============================================================================
// 5. EXTRACTOR ERROR HANDLERS
// ============================================================================

fn malformed(
    part: &'static str,
    detail: &dyn std::fmt::Display,
    req: &HttpRequest,
) -> actix_web::Error {
    tracing::debug!(path = %req.path(), "Rejected malformed {}: {}", part, detail);
    AppError::Validation(ValidationError::Malformed(part)).into()
}

/// For `web::JsonConfig::error_handler`
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    malformed("request body", &err, req)
}

/// For `web::QueryConfig::error_handler`
pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    malformed("query string", &err, req)
}

/// For `web::PathConfig::error_handler`
pub fn path_error_handler(err: PathError, req: &HttpRequest) -> actix_web::Error {
    malformed("path parameter", &err, req)
}
