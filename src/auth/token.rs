//! Bearer token issuing and verification.
//!
//! Session tokens are HS256 JWTs carrying the user id. Every token has a
//! random `jti` so that two logins in the same second still produce distinct
//! tokens, which matters for the revocation list.

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::datetime::from_unix;
use crate::{FolioError, Result};

/// Audience value marking an OAuth `state` token, so it can never be used
/// as a session token and vice versa.
const OAUTH_STATE_AUDIENCE: &str = "folio-oauth-state";

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: i64,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiration (Unix seconds).
    pub exp: i64,
    /// Unique token ID.
    pub jti: String,
}

impl Claims {
    /// Expiry in storage timestamp format.
    pub fn expires_at(&self) -> Option<String> {
        from_unix(self.exp)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StateClaims {
    aud: String,
    exp: i64,
    nonce: String,
}

/// Issues and verifies signed tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_secs: i64,
    state_expiry_secs: i64,
}

impl TokenService {
    /// Create a token service from a shared secret.
    pub fn new(secret: &str, expiry_days: u64, state_expiry_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_secs: i64::try_from(expiry_days)
                .unwrap_or(i64::MAX)
                .saturating_mul(24 * 60 * 60),
            state_expiry_secs: i64::try_from(state_expiry_secs).unwrap_or(i64::MAX),
        }
    }

    /// Session lifetime in seconds.
    pub fn expiry_secs(&self) -> i64 {
        self.expiry_secs
    }

    /// Issue a session token for a user.
    pub fn issue(&self, user_id: i64) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now.saturating_add(self.expiry_secs),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            FolioError::Auth(format!("failed to generate token: {e}"))
        })
    }

    /// Verify a session token's signature and expiry.
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::debug!("JWT validation failed: {}", e);
                    AuthError::InvalidToken
                }
            })
    }

    /// Decode a token's claims without checking expiry.
    ///
    /// The signature is still verified. Used at logout to learn when a
    /// revoked token stops mattering.
    pub fn peek(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .ok()
            .map(|data| data.claims)
    }

    /// Issue a short-lived `state` value for an OAuth authorization request.
    pub fn issue_oauth_state(&self) -> Result<String> {
        let claims = StateClaims {
            aud: OAUTH_STATE_AUDIENCE.to_string(),
            exp: Utc::now().timestamp().saturating_add(self.state_expiry_secs),
            nonce: uuid::Uuid::new_v4().to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| FolioError::OAuth(format!("failed to sign state: {e}")))
    }

    /// Check an OAuth `state` value returned by the provider.
    pub fn verify_oauth_state(&self, state: &str) -> bool {
        let mut validation = Validation::default();
        validation.set_audience(&[OAUTH_STATE_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "aud"]);
        decode::<StateClaims>(state, &self.decoding_key, &validation).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret-0123456789", 7, 600)
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();
        let token = tokens.issue(42).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
        assert!(claims.expires_at().is_some());
    }

    #[test]
    fn test_huge_expiry_saturates() {
        let tokens = TokenService::new("test-secret-0123456789", u64::MAX, 600);
        let token = tokens.issue(1).unwrap();
        assert_eq!(tokens.verify(&token).unwrap().exp, i64::MAX);
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens = service();
        assert_ne!(tokens.issue(1).unwrap(), tokens.issue(1).unwrap());
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = service().issue(1).unwrap();
        let other = TokenService::new("another-secret-987654321", 7, 600);
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(
            service().verify("garbage"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            iat: now - 7200,
            exp: now - 3600,
            jti: "old".to_string(),
        };
        let token = encode(&Header::default(), &claims, &tokens.encoding_key).unwrap();

        assert!(matches!(tokens.verify(&token), Err(AuthError::TokenExpired)));
        assert_eq!(tokens.peek(&token).unwrap().sub, 1);
    }

    #[test]
    fn test_oauth_state() {
        let tokens = service();
        let state = tokens.issue_oauth_state().unwrap();
        assert!(tokens.verify_oauth_state(&state));
        assert!(!tokens.verify_oauth_state("forged"));

        // A session token is not a valid state and vice versa.
        let session = tokens.issue(1).unwrap();
        assert!(!tokens.verify_oauth_state(&session));
        assert!(tokens.verify(&state).is_err());
    }
}
