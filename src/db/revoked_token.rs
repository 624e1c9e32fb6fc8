//! Revoked bearer token store.
//!
//! Logout adds the presented token here. Entries remember when the token
//! would have expired so that the cleanup task can drop them once they can no
//! longer be replayed.

use super::DbPool;
use crate::datetime::now_timestamp;
use crate::{FolioError, Result};

/// Repository for the token denylist.
pub struct RevokedTokenRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> RevokedTokenRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Revoke a token. Revoking an already revoked token is a no-op.
    ///
    /// `expires_at` is the token's own expiry in storage format, if known.
    pub async fn revoke(&self, token: &str, expires_at: Option<&str>) -> Result<()> {
        sqlx::query(
            "INSERT INTO revoked_tokens (token, expires_at, revoked_at) VALUES (?, ?, ?)
             ON CONFLICT(token) DO NOTHING",
        )
        .bind(token)
        .bind(expires_at)
        .bind(now_timestamp())
        .execute(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(())
    }

    /// Check whether a token has been revoked.
    pub async fn is_revoked(&self, token: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE token = ?)")
                .bind(token)
                .fetch_one(self.pool)
                .await
                .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(exists)
    }

    /// Delete entries whose token has expired.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM revoked_tokens WHERE expires_at IS NOT NULL AND expires_at < ?",
        )
        .bind(now_timestamp())
        .execute(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Number of entries in the denylist.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM revoked_tokens")
            .fetch_one(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(count)
    }
}
