//! One-off setup tasks run from the command line.

use crate::auth::hash_password;
use crate::blog::{slugify, CategoryRepository, NewCategory};
use crate::config::AdminConfig;
use crate::db::{NewUser, Role, User, UserFilter, UserRepository};
use crate::{Database, FolioError, Result};

/// Categories created by `seed-categories`.
pub const SAMPLE_CATEGORIES: &[(&str, &str)] = &[
    ("Technology", "Tech news, trends and the tools behind them"),
    ("Programming", "Languages, algorithms and everyday coding"),
    ("Web Development", "Frontend and backend development for the web"),
    ("Mobile Development", "Building apps for iOS and Android"),
    ("Data Science", "Data analysis, machine learning and visualisation"),
];

/// Result of `create_admin`.
#[derive(Debug)]
pub enum AdminOutcome {
    Created(User),
    /// An admin account already exists; nothing was changed.
    AlreadyExists(User),
}

/// Create the administrator account described by `[admin]`.
pub async fn create_admin(db: &Database, config: &AdminConfig) -> Result<AdminOutcome> {
    let repo = UserRepository::new(db.pool());

    let mut admins = repo
        .list(
            &UserFilter {
                role: Some(Role::Admin),
                ..Default::default()
            },
            Default::default(),
            0,
            1,
        )
        .await?;
    if let Some(existing) = admins.pop() {
        return Ok(AdminOutcome::AlreadyExists(existing));
    }

    if config.email.is_empty() || config.password.is_empty() {
        return Err(FolioError::Config(
            "admin.email and admin.password must be set".to_string(),
        ));
    }
    if repo.username_exists(&config.username, None).await? {
        return Err(FolioError::Conflict(format!(
            "username '{}' is already taken",
            config.username
        )));
    }
    if repo.email_exists(&config.email).await? {
        return Err(FolioError::Conflict(format!(
            "email '{}' is already registered",
            config.email
        )));
    }

    let password =
        hash_password(&config.password).map_err(|e| FolioError::Validation(e.to_string()))?;
    let user = repo
        .create(
            &NewUser::new(&config.username, &config.email, password, &config.full_name)
                .with_role(Role::Admin),
        )
        .await?;
    tracing::info!(user_id = user.id, username = %user.username, "Admin account created");
    Ok(AdminOutcome::Created(user))
}

/// Insert the sample categories that don't exist yet. Returns how many were
/// created.
pub async fn seed_categories(db: &Database) -> Result<usize> {
    let repo = CategoryRepository::new(db.pool());
    let mut created = 0;

    for (name, description) in SAMPLE_CATEGORIES {
        if repo.find_by_slug_or_name(name).await?.is_some() {
            tracing::debug!(name, "Category exists, skipping");
            continue;
        }
        repo.create(&NewCategory {
            name: name.to_string(),
            slug: slugify(name),
            description: description.to_string(),
        })
        .await?;
        created += 1;
    }

    tracing::info!(created, "Sample categories seeded");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin_config() -> AdminConfig {
        AdminConfig {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: "changeme123".to_string(),
            full_name: "Site Admin".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_admin_once() {
        let db = Database::open_in_memory().await.unwrap();

        let first = create_admin(&db, &admin_config()).await.unwrap();
        let created = match first {
            AdminOutcome::Created(user) => user,
            other => panic!("expected Created, got {:?}", other),
        };
        assert_eq!(created.role, Role::Admin);

        let second = create_admin(&db, &admin_config()).await.unwrap();
        assert!(matches!(second, AdminOutcome::AlreadyExists(u) if u.id == created.id));
    }

    #[tokio::test]
    async fn test_create_admin_refuses_taken_email() {
        let db = Database::open_in_memory().await.unwrap();
        UserRepository::new(db.pool())
            .create(&NewUser::new("someone", "admin@example.com", "x", "Someone"))
            .await
            .unwrap();

        let err = create_admin(&db, &admin_config()).await.unwrap_err();
        assert!(matches!(err, FolioError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_admin_requires_credentials() {
        let db = Database::open_in_memory().await.unwrap();
        let err = create_admin(&db, &AdminConfig::default()).await.unwrap_err();
        assert!(matches!(err, FolioError::Config(_)));
    }

    #[tokio::test]
    async fn test_seed_categories_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        CategoryRepository::new(db.pool())
            .create(&NewCategory {
                name: "Technology".to_string(),
                slug: "technology".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();

        assert_eq!(seed_categories(&db).await.unwrap(), 4);
        assert_eq!(seed_categories(&db).await.unwrap(), 0);

        let slugs: Vec<_> = CategoryRepository::new(db.pool())
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.slug)
            .collect();
        assert!(slugs.contains(&"web-development".to_string()));
        assert_eq!(slugs.len(), 5);
    }
}
