//! Configuration module for Folio.

use serde::Deserialize;
use std::path::Path;

use crate::{FolioError, Result};

/// Minimum accepted length of the token signing secret.
pub const MIN_JWT_SECRET_LENGTH: usize = 16;

/// Longest accepted session lifetime in days.
pub const MAX_TOKEN_EXPIRY_DAYS: u64 = 365;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deployment environment ("development" exposes internal error detail).
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_environment() -> String {
    "production".to_string()
}

impl ServerConfig {
    /// Whether internal error details may be sent to clients.
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/folio.db".to_string()
}

fn default_max_connections() -> u32 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the application log file.
    #[serde(default = "default_log_file")]
    pub file: String,
    /// Path to the HTTP access log file.
    #[serde(default = "default_access_file")]
    pub access_file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/folio.log".to_string()
}

fn default_access_file() -> String {
    "logs/access.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
            access_file: default_access_file(),
        }
    }
}

/// Token issuing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign bearer tokens.
    #[serde(default)]
    pub jwt_secret: String,
    /// Bearer token lifetime in days.
    #[serde(default = "default_token_expiry_days")]
    pub token_expiry_days: u64,
    /// Lifetime of the OAuth `state` token in seconds.
    #[serde(default = "default_oauth_state_expiry")]
    pub oauth_state_expiry_secs: u64,
}

fn default_token_expiry_days() -> u64 {
    7
}

fn default_oauth_state_expiry() -> u64 {
    600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiry_days: default_token_expiry_days(),
            oauth_state_expiry_secs: default_oauth_state_expiry(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Requests allowed per IP within one window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Login/register attempts allowed per IP per minute.
    #[serde(default = "default_login_per_minute")]
    pub login_per_minute: u32,
}

fn default_window_secs() -> u64 {
    900 // 15 minutes
}

fn default_max_requests() -> u32 {
    100
}

fn default_login_per_minute() -> u32 {
    10
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
            login_per_minute: default_login_per_minute(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Frontend origin; also the target of OAuth redirects.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    /// Additional allowed origins.
    #[serde(default)]
    pub origins: Vec<String>,
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

impl CorsConfig {
    /// All allowed origins, frontend first.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = Vec::with_capacity(self.origins.len() + 1);
        if !self.frontend_url.is_empty() {
            origins.push(self.frontend_url.trim_end_matches('/').to_string());
        }
        for origin in &self.origins {
            if !origins.contains(origin) {
                origins.push(origin.clone());
            }
        }
        origins
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            frontend_url: default_frontend_url(),
            origins: vec![],
        }
    }
}

/// Google OAuth client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client ID.
    #[serde(default)]
    pub client_id: String,
    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: String,
    /// Redirect URI registered with Google.
    #[serde(default)]
    pub callback_url: String,
}

impl GoogleConfig {
    /// Whether all credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.callback_url.is_empty()
    }
}

/// OAuth providers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthConfig {
    /// Google sign-in.
    #[serde(default)]
    pub google: GoogleConfig,
}

/// Outbound mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host (empty disables mail).
    #[serde(default)]
    pub smtp_host: String,
    /// SMTP port (STARTTLS).
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_user: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Recipient of contact form notifications (defaults to the SMTP user).
    #[serde(default)]
    pub admin_address: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "noreply@folio.local".to_string()
}

impl MailConfig {
    /// Whether outbound mail is enabled.
    pub fn is_configured(&self) -> bool {
        !self.smtp_host.is_empty() && !self.notification_address().is_empty()
    }

    /// Address that receives contact notifications.
    pub fn notification_address(&self) -> &str {
        if self.admin_address.is_empty() {
            &self.smtp_user
        } else {
            &self.admin_address
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_user: String::new(),
            smtp_password: String::new(),
            from_address: default_from_address(),
            admin_address: String::new(),
        }
    }
}

/// Hosted media service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Cloud account name.
    #[serde(default)]
    pub cloud_name: String,
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// API secret used to sign uploads.
    #[serde(default)]
    pub api_secret: String,
    /// Destination folder.
    #[serde(default = "default_media_folder")]
    pub folder: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
    /// Base URL of the upload API.
    #[serde(default = "default_upload_base_url")]
    pub upload_base_url: String,
}

fn default_media_folder() -> String {
    "blogs/images".to_string()
}

fn default_max_upload_mb() -> u64 {
    10
}

fn default_upload_base_url() -> String {
    "https://api.cloudinary.com/v1_1".to_string()
}

impl MediaConfig {
    /// Whether uploads can be forwarded.
    pub fn is_configured(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: default_media_folder(),
            max_upload_mb: default_max_upload_mb(),
            upload_base_url: default_upload_base_url(),
        }
    }
}

/// Initial administrator account used by `create-admin`.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Username.
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Plain-text password (hashed on creation).
    #[serde(default)]
    pub password: String,
    /// Display name.
    #[serde(default = "default_admin_full_name")]
    pub full_name: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_full_name() -> String {
    "Administrator".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            email: String::new(),
            password: String::new(),
            full_name: default_admin_full_name(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Token configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// CORS.
    #[serde(default)]
    pub cors: CorsConfig,
    /// OAuth providers.
    #[serde(default)]
    pub oauth: OAuthConfig,
    /// Outbound mail.
    #[serde(default)]
    pub mail: MailConfig,
    /// Image uploads.
    #[serde(default)]
    pub media: MediaConfig,
    /// Initial admin account.
    #[serde(default)]
    pub admin: AdminConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FolioError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FolioError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Empty values are ignored. Numeric variables that fail to parse are
    /// ignored as well.
    pub fn apply_env_overrides(&mut self) {
        override_string("FOLIO_JWT_SECRET", &mut self.auth.jwt_secret);
        override_string("FOLIO_DATABASE_PATH", &mut self.database.path);
        override_string("FRONTEND_URL", &mut self.cors.frontend_url);

        override_string("GOOGLE_CLIENT_ID", &mut self.oauth.google.client_id);
        override_string("GOOGLE_CLIENT_SECRET", &mut self.oauth.google.client_secret);
        override_string("GOOGLE_CALLBACK_URL", &mut self.oauth.google.callback_url);

        override_string("SMTP_HOST", &mut self.mail.smtp_host);
        override_string("SMTP_USER", &mut self.mail.smtp_user);
        override_string("SMTP_PASSWORD", &mut self.mail.smtp_password);

        override_string("CLOUD_NAME", &mut self.media.cloud_name);
        override_string("CLOUD_KEY", &mut self.media.api_key);
        override_string("CLOUD_SECRET", &mut self.media.api_secret);

        override_string("ADMIN_USERNAME", &mut self.admin.username);
        override_string("ADMIN_EMAIL", &mut self.admin.email);
        override_string("ADMIN_PASSWORD", &mut self.admin.password);
        override_string("ADMIN_FULL_NAME", &mut self.admin.full_name);

        override_parsed("RATE_LIMIT_WINDOW_SECS", &mut self.rate_limit.window_secs);
        override_parsed("RATE_LIMIT_MAX_REQUESTS", &mut self.rate_limit.max_requests);
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(FolioError::Config(format!(
                "jwt_secret must be at least {MIN_JWT_SECRET_LENGTH} characters. \
                 Set it in config.toml or via FOLIO_JWT_SECRET environment variable."
            )));
        }
        if !(1..=MAX_TOKEN_EXPIRY_DAYS).contains(&self.auth.token_expiry_days) {
            return Err(FolioError::Config(format!(
                "token_expiry_days must be between 1 and {MAX_TOKEN_EXPIRY_DAYS}"
            )));
        }
        if self.rate_limit.window_secs == 0 || self.rate_limit.max_requests == 0 {
            return Err(FolioError::Config(
                "rate_limit window_secs and max_requests must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn override_string(var: &str, target: &mut String) {
    if let Ok(value) = std::env::var(var) {
        if !value.is_empty() {
            *target = value;
        }
    }
}

fn override_parsed<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Some(value) = std::env::var(var).ok().and_then(|v| v.parse().ok()) {
        *target = value;
    }
}
