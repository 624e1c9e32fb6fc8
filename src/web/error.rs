//! API error handling.
//!
//! Every failure leaves the server as the standard envelope:
//! `{success: false, message, timestamp, errors?}`.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::datetime::now_timestamp;
use crate::FolioError;

/// Message used for every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong!";

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed request or invalid state (400).
    BadRequest,
    /// Field-level validation failure (400).
    ValidationFailed,
    /// Missing or unusable credentials (401).
    Unauthorized,
    /// Forbidden (403).
    Forbidden,
    /// Not found (404).
    NotFound,
    /// Conflict (409).
    Conflict,
    /// Payload too large (413).
    PayloadTooLarge,
    /// Rate limited (429).
    TooManyRequests,
    /// Internal server error (500).
    InternalError,
    /// A required upstream service is not configured (503).
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest | ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// A single field-level problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }
}

/// Failure envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    /// Internal error detail, only filled in development.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Internal error text attached to 500 responses as an extension.
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    errors: Option<Vec<FieldError>>,
    detail: Option<String>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            errors: None,
            detail: None,
        }
    }

    /// Attach field-level errors.
    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TooManyRequests, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Internal failure. `detail` is logged and only shown in development.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InternalError,
            message: INTERNAL_ERROR_MESSAGE.to_string(),
            errors: None,
            detail: Some(detail.into()),
        }
    }

    /// Validation failure; the message names the first problem.
    pub fn validation(errors: Vec<FieldError>) -> Self {
        let message = match errors.first() {
            Some(first) => format!("Validation failed: {}", first.message),
            None => "Validation failed".to_string(),
        };
        Self::new(ErrorCode::ValidationFailed, message).with_errors(errors)
    }

    /// Create a validation error from validator::ValidationErrors.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = Vec::new();

        for (field, field_errors) in errors.field_errors() {
            let name = camel_case(&field);
            for e in field_errors.iter() {
                fields.push(FieldError {
                    field: name.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", name)),
                    value: e.params.get("value").cloned(),
                });
            }
        }
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        Self::validation(fields)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            success: false,
            message: self.message,
            timestamp: now_timestamp(),
            errors: self.errors,
            error: None,
        };
        let mut response = (status, Json(body)).into_response();
        if let Some(detail) = self.detail {
            response.extensions_mut().insert(InternalDetail(detail));
        }
        response
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<FolioError> for ApiError {
    fn from(err: FolioError) -> Self {
        match err {
            FolioError::Auth(msg) => ApiError::unauthorized(msg),
            FolioError::Permission(msg) => ApiError::forbidden(msg),
            FolioError::Validation(msg) | FolioError::InvalidState(msg) => {
                ApiError::bad_request(msg)
            }
            FolioError::NotFound(_) => ApiError::not_found(err.to_string()),
            FolioError::Conflict(msg) => ApiError::conflict(msg),
            other => {
                tracing::error!(error = %other, "Internal error");
                ApiError::internal(other.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Internal(e) => e.into(),
            AuthError::Forbidden => ApiError::forbidden(err.to_string()),
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

/// Re-render 500 responses with their internal detail. Installed only in
/// development.
pub async fn expose_internal_errors(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let Some(InternalDetail(detail)) = response.extensions_mut().remove::<InternalDetail>() else {
        return response;
    };
    let body = ErrorBody {
        success: false,
        message: INTERNAL_ERROR_MESSAGE.to_string(),
        timestamp: now_timestamp(),
        errors: None,
        error: Some(detail),
    };
    (response.status(), Json(body)).into_response()
}
