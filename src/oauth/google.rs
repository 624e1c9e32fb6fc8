//! Google sign-in (authorization code flow).

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::config::GoogleConfig;
use crate::{FolioError, Result};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const SCOPE: &str = "openid email profile";
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Profile returned by the userinfo endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GoogleProfile {
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// HTTP client for Google's OAuth endpoints.
#[derive(Debug, Clone)]
pub struct GoogleClient {
    client: Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
    authorize_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleClient {
    /// Returns `Ok(None)` when Google sign-in is not configured.
    pub fn from_config(config: &GoogleConfig) -> Result<Option<Self>> {
        if !config.is_configured() {
            return Ok(None);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FolioError::OAuth(format!("failed to create HTTP client: {}", e)))?;

        Ok(Some(Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            callback_url: config.callback_url.clone(),
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
        }))
    }

    /// Point the client at different token and userinfo endpoints.
    pub fn with_endpoints(mut self, token_url: &str, userinfo_url: &str) -> Self {
        self.token_url = token_url.to_string();
        self.userinfo_url = userinfo_url.to_string();
        self
    }

    /// URL the browser is sent to for consent.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", SCOPE),
                ("state", state),
            ],
        )
        .map_err(|e| FolioError::OAuth(format!("invalid authorize URL: {}", e)))?;
        Ok(url.into())
    }

    /// Trade an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| FolioError::OAuth(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FolioError::OAuth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| FolioError::OAuth(format!("invalid token response: {}", e)))?;
        Ok(token.access_token)
    }

    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| FolioError::OAuth(format!("userinfo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FolioError::OAuth(format!(
                "userinfo endpoint returned {}",
                response.status()
            )));
        }

        let profile: GoogleProfile = response
            .json()
            .await
            .map_err(|e| FolioError::OAuth(format!("invalid userinfo response: {}", e)))?;
        if profile.email.is_empty() {
            return Err(FolioError::OAuth("profile has no email".to_string()));
        }
        Ok(profile)
    }
}
