//! Middleware for Web API.

pub mod access_log;
pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod security;

pub use access_log::access_log;
pub use auth::{bearer_token, AdminUser, ClientInfo, CurrentUser, MaybeUser};
pub use cors::create_cors_layer;
pub use rate_limit::{api_rate_limit, client_ip, login_rate_limit, RateLimitState};
pub use security::security_headers;
