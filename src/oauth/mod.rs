//! External sign-in and account linking.

mod google;

pub use google::{GoogleClient, GoogleProfile};

use serde_json::json;

use crate::auth::random_password_hash;
use crate::db::{DbPool, NewUser, User, UserRepository};
use crate::{FolioError, Result};

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 30;
const MAX_SUFFIX_ATTEMPTS: u32 = 1000;

/// Find the account for a provider profile, creating one on first sign-in.
///
/// Accounts are matched by email. Deactivated accounts are refused.
pub async fn find_or_create_user(pool: &DbPool, profile: &GoogleProfile) -> Result<User> {
    let repo = UserRepository::new(pool);

    if let Some(user) = repo.get_by_email(&profile.email).await? {
        if !user.is_active {
            return Err(FolioError::Auth("Account is deactivated".to_string()));
        }
        return Ok(user);
    }

    let username = unique_username(&repo, &profile.email).await?;
    let password =
        random_password_hash().map_err(|e| FolioError::OAuth(format!("password hash: {e}")))?;
    let full_name = if profile.name.trim().is_empty() {
        username.clone()
    } else {
        profile.name.trim().to_string()
    };

    let user = repo
        .create(&NewUser::new(&username, &profile.email, password, full_name).with_avatar(&profile.picture))
        .await?;
    tracing::info!(user_id = user.id, username = %user.username, "Created account from Google sign-in");
    Ok(user)
}

/// Username candidate derived from an email's local part.
pub fn username_base(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let mut base: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(MAX_USERNAME_LENGTH)
        .collect();
    if base.is_empty() {
        base.push_str("user");
    }
    while base.chars().count() < MIN_USERNAME_LENGTH {
        base.push('_');
    }
    base
}

async fn unique_username(repo: &UserRepository<'_>, email: &str) -> Result<String> {
    let base = username_base(email);
    if !repo.username_exists(&base, None).await? {
        return Ok(base);
    }

    for n in 1..=MAX_SUFFIX_ATTEMPTS {
        let suffix = n.to_string();
        let keep = MAX_USERNAME_LENGTH - suffix.len();
        let candidate: String = base.chars().take(keep).chain(suffix.chars()).collect();
        if !repo.username_exists(&candidate, None).await? {
            return Ok(candidate);
        }
    }

    Err(FolioError::Conflict(format!(
        "no free username for {}",
        base
    )))
}

/// Redirect target after a successful sign-in.
pub fn success_redirect(frontend_url: &str, token: &str, user: &User) -> String {
    let summary = json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "fullName": user.full_name,
        "avatar": user.avatar,
        "role": user.role.as_str(),
    });
    format!(
        "{}/login/success?token={}&user={}",
        frontend_url.trim_end_matches('/'),
        urlencoding::encode(token),
        urlencoding::encode(&summary.to_string())
    )
}

/// Redirect target after a failed sign-in.
pub fn failure_redirect(frontend_url: &str) -> String {
    format!("{}/login", frontend_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserUpdate;
    use crate::Database;

    fn profile(email: &str) -> GoogleProfile {
        GoogleProfile {
            email: email.to_string(),
            email_verified: true,
            name: "Jane Doe".to_string(),
            picture: "https://img.example/jane.png".to_string(),
        }
    }

    #[test]
    fn test_username_base() {
        assert_eq!(username_base("jane.doe+blog@gmail.com"), "janedoeblog");
        assert_eq!(username_base("jo@x.com"), "jo_");
        assert_eq!(username_base("...@x.com"), "user");
        assert_eq!(username_base(&format!("{}@x.com", "a".repeat(40))).len(), 30);
    }

    #[tokio::test]
    async fn test_creates_then_reuses_account() {
        let db = Database::open_in_memory().await.unwrap();
        let created = find_or_create_user(db.pool(), &profile("jane@gmail.com"))
            .await
            .unwrap();
        assert_eq!(created.username, "jane");
        assert_eq!(created.full_name, "Jane Doe");
        assert_eq!(created.avatar, "https://img.example/jane.png");
        assert!(!created.is_admin());

        let again = find_or_create_user(db.pool(), &profile("JANE@gmail.com"))
            .await
            .unwrap();
        assert_eq!(again.id, created.id);
    }

    #[tokio::test]
    async fn test_username_collision_gets_suffix() {
        let db = Database::open_in_memory().await.unwrap();
        find_or_create_user(db.pool(), &profile("sam@a.com")).await.unwrap();
        let second = find_or_create_user(db.pool(), &profile("sam@b.com"))
            .await
            .unwrap();
        assert_eq!(second.username, "sam1");
    }

    #[tokio::test]
    async fn test_deactivated_account_refused() {
        let db = Database::open_in_memory().await.unwrap();
        let user = find_or_create_user(db.pool(), &profile("off@a.com"))
            .await
            .unwrap();
        UserRepository::new(db.pool())
            .update(user.id, &UserUpdate::new().is_active(false))
            .await
            .unwrap();

        let err = find_or_create_user(db.pool(), &profile("off@a.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, FolioError::Auth(_)));
    }

    #[tokio::test]
    async fn test_success_redirect_encodes_user() {
        let db = Database::open_in_memory().await.unwrap();
        let user = find_or_create_user(db.pool(), &profile("jane@gmail.com"))
            .await
            .unwrap();
        let url = success_redirect("https://blog.example/", "tok.en", &user);
        assert!(url.starts_with("https://blog.example/login/success?token=tok.en&user=%7B"));
        assert!(url.contains("%22username%22%3A%22jane%22"));
        assert_eq!(failure_redirect("https://blog.example/"), "https://blog.example/login");
    }
}
