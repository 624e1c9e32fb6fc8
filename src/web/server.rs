//! HTTP server for Folio.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::db::RevokedTokenRepository;
use crate::{Config, Database, FolioError, Result};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::create_router;

/// How often expired denylist entries are purged.
const TOKEN_CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Web server for the API.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    limits: Arc<RateLimitState>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| FolioError::Config(format!("invalid listen address: {e}")))?;
        let limits = Arc::new(RateLimitState::from_config(&config.rate_limit));
        let app_state = Arc::new(AppState::new(db, config)?);

        Ok(Self {
            addr,
            app_state,
            limits,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Purge expired entries from the logout denylist every hour.
    fn start_token_cleanup_task(db: Database) {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(TOKEN_CLEANUP_INTERVAL_SECS));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                match RevokedTokenRepository::new(db.pool()).cleanup_expired().await {
                    Ok(0) => tracing::debug!("No expired revoked tokens to clean up"),
                    Ok(count) => {
                        tracing::info!(deleted_count = count, "Cleaned up expired revoked tokens")
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to cleanup revoked tokens"),
                }
            }
        });
    }

    /// Build the router and start the background tasks.
    fn prepare(self) -> Router {
        Self::start_token_cleanup_task(self.app_state.db.clone());
        self.limits.clone().start_cleanup_task();
        tracing::info!("Token and rate limit cleanup tasks started");

        create_router(self.app_state, self.limits).layer(CompressionLayer::new())
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.prepare();

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.prepare();

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
