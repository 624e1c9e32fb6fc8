//! Per-IP rate limiting.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Extensions, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use crate::config::RateLimitConfig;
use crate::web::error::ApiError;

/// Message returned with every 429.
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Per-IP rate limiter using Governor.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

type LimiterMap = RwLock<HashMap<String, Arc<IpRateLimiter>>>;

/// State for rate limiting.
#[derive(Clone)]
pub struct RateLimitState {
    /// Per-IP limiters for every API route.
    api_limiters: Arc<LimiterMap>,
    /// Per-IP limiters for login and register.
    login_limiters: Arc<LimiterMap>,
    api_quota: Quota,
    login_quota: Quota,
}

impl RateLimitState {
    /// `max_requests` per `window_secs` for the API, `login_per_minute` for
    /// the credential endpoints.
    pub fn new(window_secs: u64, max_requests: u32, login_per_minute: u32) -> Self {
        let max = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
        let period = Duration::from_secs(window_secs.max(1)) / max.get();
        let api_quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(max))
            .allow_burst(max);

        let login_quota =
            Quota::per_minute(NonZeroU32::new(login_per_minute).unwrap_or(NonZeroU32::MIN));

        Self {
            api_limiters: Arc::new(RwLock::new(HashMap::new())),
            login_limiters: Arc::new(RwLock::new(HashMap::new())),
            api_quota,
            login_quota,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.window_secs,
            config.max_requests,
            config.login_per_minute,
        )
    }

    /// Get or create a rate limiter for the given IP.
    fn get_or_create_limiter(limiters: &LimiterMap, ip: &str, quota: Quota) -> Arc<IpRateLimiter> {
        {
            let read_guard = limiters.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(limiter) = read_guard.get(ip) {
                return limiter.clone();
            }
        }

        let mut write_guard = limiters.write().unwrap_or_else(PoisonError::into_inner);

        // Double-check after acquiring write lock
        if let Some(limiter) = write_guard.get(ip) {
            return limiter.clone();
        }

        let limiter = Arc::new(RateLimiter::direct(quota));
        write_guard.insert(ip.to_string(), limiter.clone());
        limiter
    }

    /// Check if a request is allowed for the general API.
    pub fn check_api(&self, ip: &str) -> bool {
        Self::get_or_create_limiter(&self.api_limiters, ip, self.api_quota)
            .check()
            .is_ok()
    }

    /// Check if a request is allowed for login/register.
    pub fn check_login(&self, ip: &str) -> bool {
        Self::get_or_create_limiter(&self.login_limiters, ip, self.login_quota)
            .check()
            .is_ok()
    }

    /// Drop limiters nobody holds a reference to.
    pub fn cleanup(&self) {
        self.api_limiters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, v| Arc::strong_count(v) > 1);
        self.login_limiters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, v| Arc::strong_count(v) > 1);
    }

    /// Start a background task to periodically clean up old entries.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(300)).await;
                self.cleanup();
            }
        });
    }
}

/// Client IP: `X-Forwarded-For` (first hop), then `X-Real-IP`, then the
/// socket address. `"unknown"` when none is available.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> String {
    if let Some(forwarded) = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next().map(str::trim) {
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("X-Real-IP").and_then(|v| v.to_str().ok()) {
        return real_ip.trim().to_string();
    }

    if let Some(ConnectInfo(addr)) = extensions.get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

fn limited(ip: &str, scope: &str) -> Response {
    tracing::warn!(ip = %ip, scope, "Rate limit exceeded");
    ApiError::too_many_requests(RATE_LIMITED_MESSAGE).into_response()
}

/// Rate limiting middleware for every API route.
pub async fn api_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(req.headers(), req.extensions());
    if !state.check_api(&ip) {
        return limited(&ip, "api");
    }
    next.run(req).await
}

/// Stricter limiter for login and register.
pub async fn login_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(req.headers(), req.extensions());
    if !state.check_login(&ip) {
        return limited(&ip, "login");
    }
    next.run(req).await
}
