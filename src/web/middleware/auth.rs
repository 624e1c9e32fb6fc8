//! Authentication extractors.
//!
//! Thin wrappers over [`crate::auth::authenticate`]: they pull the bearer
//! token out of the request and resolve it against the shared state.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, header::USER_AGENT, request::Parts, HeaderMap},
};
use std::sync::Arc;

use super::rate_limit::client_ip;
use crate::auth::{authenticate, authenticate_optional, require_admin, AuthError, Caller};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::User;

/// Bearer token from the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// An authenticated, active user.
///
/// Rejects the request with 401 when the token is missing, revoked,
/// invalid or expired, or the account is gone or deactivated.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub caller: Caller,
    /// The raw token, kept for logout.
    pub token: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::Unauthenticated)?;
        let caller = authenticate(state.db.pool(), &state.tokens, token).await?;
        let user = caller
            .user()
            .cloned()
            .ok_or(AuthError::Unauthenticated)?;

        Ok(CurrentUser {
            user,
            caller,
            token: token.to_string(),
        })
    }
}

/// An authenticated administrator. Non-admins get 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        require_admin(&current.caller)?;
        Ok(AdminUser(current))
    }
}

/// Optional authentication. Never rejects; any failure yields
/// [`Caller::Anonymous`].
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Caller);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers);
        let caller = authenticate_optional(state.db.pool(), &state.tokens, token).await;
        Ok(MaybeUser(caller))
    }
}

/// Client address and user agent, recorded on comments for moderation.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = client_ip(&parts.headers, &parts.extensions);
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(ClientInfo {
            ip: (ip != "unknown").then_some(ip),
            user_agent,
        })
    }
}
