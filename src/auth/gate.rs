//! Request authentication.
//!
//! Resolves a bearer token into a [`Caller`]. Checks run in a fixed order:
//! the revocation list first, then signature and expiry, then the account
//! itself. Nothing is written.

use thiserror::Error;

use super::{Caller, TokenService};
use crate::db::{DbPool, RevokedTokenRepository, UserRepository};
use crate::FolioError;

/// Why a request could not be authenticated or authorized.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Access denied. No token provided.")]
    Unauthenticated,

    #[error("Token has been revoked.")]
    TokenRevoked,

    #[error("Invalid token.")]
    InvalidToken,

    #[error("Token expired.")]
    TokenExpired,

    #[error("Invalid token. User not found.")]
    UserNotFound,

    #[error("Account is deactivated.")]
    AccountDeactivated,

    #[error("Access denied. Admin privileges required.")]
    Forbidden,

    /// Store lookup failed.
    #[error(transparent)]
    Internal(#[from] FolioError),
}

/// Authenticate a bearer token.
pub async fn authenticate(
    pool: &DbPool,
    tokens: &TokenService,
    token: &str,
) -> Result<Caller, AuthError> {
    if RevokedTokenRepository::new(pool).is_revoked(token).await? {
        return Err(AuthError::TokenRevoked);
    }

    let claims = tokens.verify(token)?;

    let user = UserRepository::new(pool)
        .get_by_id(claims.sub)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if !user.is_active {
        return Err(AuthError::AccountDeactivated);
    }

    Ok(Caller::from_user(user))
}

/// Authenticate a bearer token, falling back to [`Caller::Anonymous`] on
/// any failure.
pub async fn authenticate_optional(
    pool: &DbPool,
    tokens: &TokenService,
    token: Option<&str>,
) -> Caller {
    let Some(token) = token else {
        return Caller::Anonymous;
    };
    match authenticate(pool, tokens, token).await {
        Ok(caller) => caller,
        Err(e) => {
            tracing::debug!("Optional authentication ignored: {}", e);
            Caller::Anonymous
        }
    }
}

/// Require an admin caller.
pub fn require_admin(caller: &Caller) -> Result<(), AuthError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, Role, UserUpdate};
    use crate::Database;

    fn tokens() -> TokenService {
        TokenService::new("gate-test-secret-0123", 7, 600)
    }

    async fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());
        let alice = repo
            .create(&NewUser::new("alice", "a@x.com", "hash", "Alice"))
            .await
            .unwrap();
        let admin = repo
            .create(&NewUser::new("root", "root@x.com", "hash", "Root").with_role(Role::Admin))
            .await
            .unwrap();
        (db, alice.id, admin.id)
    }

    #[tokio::test]
    async fn test_authenticate_user_and_admin() {
        let (db, alice, admin) = setup().await;
        let tokens = tokens();

        let caller = authenticate(db.pool(), &tokens, &tokens.issue(alice).unwrap())
            .await
            .unwrap();
        assert!(matches!(caller, Caller::User(ref u) if u.username == "alice"));

        let caller = authenticate(db.pool(), &tokens, &tokens.issue(admin).unwrap())
            .await
            .unwrap();
        assert!(caller.is_admin());
        assert!(require_admin(&caller).is_ok());
    }

    #[tokio::test]
    async fn test_revoked_token_checked_first() {
        let (db, alice, _) = setup().await;
        let tokens = tokens();
        let token = tokens.issue(alice).unwrap();

        RevokedTokenRepository::new(db.pool())
            .revoke(&token, None)
            .await
            .unwrap();

        let result = authenticate(db.pool(), &tokens, &token).await;
        assert!(matches!(result, Err(AuthError::TokenRevoked)));

        // Even a garbage token is reported as revoked once listed.
        RevokedTokenRepository::new(db.pool())
            .revoke("garbage", None)
            .await
            .unwrap();
        let result = authenticate(db.pool(), &tokens, "garbage").await;
        assert!(matches!(result, Err(AuthError::TokenRevoked)));
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_users() {
        let (db, alice, _) = setup().await;
        let tokens = tokens();

        let result = authenticate(db.pool(), &tokens, &tokens.issue(9999).unwrap()).await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));

        UserRepository::new(db.pool())
            .update(alice, &UserUpdate::new().is_active(false))
            .await
            .unwrap();
        let result = authenticate(db.pool(), &tokens, &tokens.issue(alice).unwrap()).await;
        assert!(matches!(result, Err(AuthError::AccountDeactivated)));
    }

    #[tokio::test]
    async fn test_optional_falls_back_to_anonymous() {
        let (db, alice, _) = setup().await;
        let tokens = tokens();

        assert!(authenticate_optional(db.pool(), &tokens, None)
            .await
            .is_anonymous());
        assert!(authenticate_optional(db.pool(), &tokens, Some("bad"))
            .await
            .is_anonymous());

        let token = tokens.issue(alice).unwrap();
        let caller = authenticate_optional(db.pool(), &tokens, Some(&token)).await;
        assert_eq!(caller.id(), Some(alice));
        assert!(matches!(require_admin(&caller), Err(AuthError::Forbidden)));
    }
}
