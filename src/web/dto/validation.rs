//! Validating extractors and custom field validators.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::blog::PostStatus;
use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// Deserialization failures are reported as 400 with the parser's message;
/// validation failures as 400 with one `errors[]` entry per problem.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e.body_text())))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

/// Query-string counterpart of [`ValidatedJson`].
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid query: {}", e.body_text())))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedQuery(value))
    }
}

// ============================================================================
// Custom Validators
// ============================================================================

/// Validate that a string is not empty after trimming whitespace.
pub fn not_empty_trimmed(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_empty_trimmed").with_message("Must not be empty".into()));
    }
    Ok(())
}

/// Usernames are ASCII letters, digits and underscores.
pub fn username_chars(value: &str) -> Result<(), ValidationError> {
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::new("username_chars").with_message(
            "Username can only contain letters, numbers, and underscores".into(),
        ));
    }
    Ok(())
}

/// Must name a post status.
pub fn post_status(value: &str) -> Result<(), ValidationError> {
    value.parse::<PostStatus>().map(|_| ()).map_err(|_| {
        ValidationError::new("post_status")
            .with_message("Status must be draft, published, or archived".into())
    })
}

/// Must name a user role.
pub fn user_role(value: &str) -> Result<(), ValidationError> {
    value.parse::<crate::Role>().map(|_| ()).map_err(|_| {
        ValidationError::new("user_role").with_message("Role must be user or admin".into())
    })
}

/// Each tag is 1-30 characters after trimming.
#[allow(clippy::ptr_arg)]
pub fn tag_list(tags: &Vec<String>) -> Result<(), ValidationError> {
    for tag in tags {
        let len = tag.trim().chars().count();
        if len == 0 || len > 30 {
            return Err(ValidationError::new("tag_list")
                .with_message("Each tag must be between 1 and 30 characters".into()));
        }
    }
    Ok(())
}
