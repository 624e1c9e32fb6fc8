//! API handlers.

pub mod auth;
pub mod category;
pub mod comment;
pub mod contact;
pub mod health;
pub mod image;
pub mod oauth;
pub mod post;
pub mod user;

use std::sync::Arc;

use crate::contact::ContactMailer;
use crate::media::MediaClient;
use crate::oauth::GoogleClient;
use crate::web::error::{ApiError, FieldError};
use crate::{Config, Database, Result, TokenService};

/// Application state shared across handlers.
pub struct AppState {
    pub db: Database,
    pub tokens: TokenService,
    pub config: Arc<Config>,
    /// Contact notifications; `None` when SMTP is not configured.
    pub mailer: Option<ContactMailer>,
    /// Image host; `None` when not configured.
    pub media: Option<MediaClient>,
    /// Google sign-in; `None` when not configured.
    pub google: Option<GoogleClient>,
}

impl AppState {
    /// Build the state, wiring up every optional collaborator the config
    /// enables.
    pub fn new(db: Database, config: Config) -> Result<Self> {
        let tokens = TokenService::new(
            &config.auth.jwt_secret,
            config.auth.token_expiry_days,
            config.auth.oauth_state_expiry_secs,
        );
        let mailer = ContactMailer::from_config(&config.mail);
        let media = MediaClient::from_config(&config.media)?;
        let google = GoogleClient::from_config(&config.oauth.google)?;

        if mailer.is_none() {
            tracing::warn!("SMTP is not configured; contact notifications are disabled");
        }
        if media.is_none() {
            tracing::warn!("Media service is not configured; image upload is disabled");
        }
        if google.is_none() {
            tracing::info!("Google OAuth is not configured");
        }

        Ok(Self {
            db,
            tokens,
            config: Arc::new(config),
            mailer,
            media,
            google,
        })
    }

    /// Replace the Google client (tests point it at a fake provider).
    pub fn with_google(mut self, google: GoogleClient) -> Self {
        self.google = Some(google);
        self
    }

    /// Replace the media client.
    pub fn with_media(mut self, media: MediaClient) -> Self {
        self.media = Some(media);
        self
    }
}

/// Parse a numeric path id.
pub(crate) fn parse_id(raw: &str, resource: &str) -> std::result::Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("Invalid {resource} ID")))
}

/// Parse an optional `sort` query value, falling back to the default order.
pub(crate) fn parse_sort<T>(raw: Option<&str>) -> std::result::Result<T, ApiError>
where
    T: std::str::FromStr<Err = String> + Default,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(T::default()),
        Some(raw) => raw.parse().map_err(|message: String| {
            let mut error = FieldError::new("sort", message);
            error.value = Some(serde_json::Value::String(raw.to_string()));
            ApiError::validation(vec![error])
        }),
    }
}
