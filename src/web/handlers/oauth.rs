//! Google sign-in handlers.

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use std::sync::Arc;

use crate::db::UserRepository;
use crate::oauth::{failure_redirect, find_or_create_user, success_redirect, GoogleClient};
use crate::web::dto::OAuthCallbackQuery;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::FolioError;

fn google_client(state: &AppState) -> Result<&GoogleClient, ApiError> {
    state
        .google
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Google sign-in is not configured"))
}

/// GET /api/auth/google - Redirect to Google's consent screen.
pub async fn google_login(State(state): State<Arc<AppState>>) -> Result<Redirect, ApiError> {
    let google = google_client(&state)?;
    let csrf_state = state.tokens.issue_oauth_state()?;
    let url = google.authorize_url(&csrf_state)?;
    Ok(Redirect::to(&url))
}

/// GET /api/auth/google/callback - Finish sign-in and hand the token to
/// the frontend.
pub async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Redirect, ApiError> {
    let google = google_client(&state)?;
    let frontend = &state.config.cors.frontend_url;

    match complete_sign_in(&state, google, query).await {
        Ok(token_url) => Ok(Redirect::to(&token_url)),
        Err(e) => {
            tracing::warn!(error = %e, "Google sign-in failed");
            Ok(Redirect::to(&failure_redirect(frontend)))
        }
    }
}

async fn complete_sign_in(
    state: &AppState,
    google: &GoogleClient,
    query: OAuthCallbackQuery,
) -> crate::Result<String> {
    if let Some(error) = query.error {
        return Err(FolioError::OAuth(format!("provider returned '{error}'")));
    }
    let csrf_state = query
        .state
        .ok_or_else(|| FolioError::OAuth("missing state".to_string()))?;
    if !state.tokens.verify_oauth_state(&csrf_state) {
        return Err(FolioError::OAuth("invalid or expired state".to_string()));
    }
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| FolioError::OAuth("missing authorization code".to_string()))?;

    let access_token = google.exchange_code(&code).await?;
    let profile = google.fetch_profile(&access_token).await?;
    let user = find_or_create_user(state.db.pool(), &profile).await?;

    UserRepository::new(state.db.pool())
        .update_last_login(user.id)
        .await?;
    let token = state.tokens.issue(user.id)?;

    tracing::info!(user_id = user.id, username = %user.username, "Google sign-in");
    Ok(success_redirect(&state.config.cors.frontend_url, &token, &user))
}
