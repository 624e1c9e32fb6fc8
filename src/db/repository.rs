//! User repository for Folio.
//!
//! This module provides CRUD operations for users in the database.

use std::str::FromStr;

use sqlx::{QueryBuilder, Sqlite};

use super::user::{NewUser, Role, User, UserUpdate};
use super::{write_error, DbPool};
use crate::datetime::now_timestamp;
use crate::{FolioError, Result};

const USER_COLUMNS: &str = "id, username, email, password, full_name, bio, avatar, role,
                            is_active, last_login, created_at, updated_at";

/// Filter for admin user listings.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring of username, full name or email.
    pub search: Option<String>,
    /// Restrict to a role.
    pub role: Option<Role>,
    /// Restrict to active or inactive accounts.
    pub is_active: Option<bool>,
}

/// Sort order for user listings, parsed from `field` or `-field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSort {
    column: &'static str,
    descending: bool,
}

impl Default for UserSort {
    fn default() -> Self {
        Self {
            column: "created_at",
            descending: true,
        }
    }
}

impl FromStr for UserSort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (descending, field) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let column = match field {
            "createdAt" => "created_at",
            "username" => "username",
            "lastLogin" => "last_login",
            _ => return Err(format!("unsupported sort field: {field}")),
        };
        Ok(Self { column, descending })
    }
}

impl UserSort {
    fn order_clause(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!(" ORDER BY {} {direction}, id {direction}", self.column)
    }
}

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Returns the created user with the assigned ID. A duplicate username or
    /// email yields `FolioError::Conflict`.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let now = now_timestamp();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, email, password, full_name, bio, avatar, role, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(&new_user.full_name)
        .bind(&new_user.bio)
        .bind(&new_user.avatar)
        .bind(new_user.role.as_str())
        .bind(&now)
        .bind(&now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| write_error(e, "username or email already exists"))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| FolioError::NotFound("User".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;

        Ok(row.map(UserRow::into_user))
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? COLLATE NOCASE"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;

        Ok(row.map(UserRow::into_user))
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;

        Ok(row.map(UserRow::into_user))
    }

    /// Check whether a username is taken by an account other than `except_id`.
    pub async fn username_exists(&self, username: &str, except_id: Option<i64>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE AND id != ?)",
        )
        .bind(username)
        .bind(except_id.unwrap_or(0))
        .fetch_one(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(exists)
    }

    /// Check whether an email is already registered.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? COLLATE NOCASE)")
                .bind(email)
                .fetch_one(self.pool)
                .await
                .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(exists)
    }

    /// Check whether any administrator exists.
    pub async fn admin_exists(&self) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')")
                .fetch_one(self.pool)
                .await
                .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(exists)
    }

    /// Update a user by ID.
    ///
    /// Only fields that are set in the update will be modified.
    /// Returns the updated user, or None if not found.
    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query.separated(", ");

        if let Some(ref password) = update.password {
            separated.push("password = ");
            separated.push_bind_unseparated(password);
        }
        if let Some(ref username) = update.username {
            separated.push("username = ");
            separated.push_bind_unseparated(username);
        }
        if let Some(ref full_name) = update.full_name {
            separated.push("full_name = ");
            separated.push_bind_unseparated(full_name);
        }
        if let Some(ref bio) = update.bio {
            separated.push("bio = ");
            separated.push_bind_unseparated(bio);
        }
        if let Some(ref avatar) = update.avatar {
            separated.push("avatar = ");
            separated.push_bind_unseparated(avatar);
        }
        if let Some(role) = update.role {
            separated.push("role = ");
            separated.push_bind_unseparated(role.as_str());
        }
        if let Some(is_active) = update.is_active {
            separated.push("is_active = ");
            separated.push_bind_unseparated(is_active);
        }
        separated.push("updated_at = ");
        separated.push_bind_unseparated(now_timestamp());

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| write_error(e, "username already exists"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Update the last login timestamp for a user.
    pub async fn update_last_login(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(now_timestamp())
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a user by ID. Their posts, comments and likes cascade.
    ///
    /// Comment counters on other authors' posts are lowered by the number of
    /// comments the user had there. Returns true if a user was deleted.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE posts SET comment_count = MAX(comment_count - (
                 SELECT COUNT(*) FROM comments c WHERE c.post_id = posts.id AND c.author_id = ?
             ), 0)
             WHERE author_id <> ? AND id IN (SELECT post_id FROM comments WHERE author_id = ?)",
        )
        .bind(id)
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// List users matching a filter.
    pub async fn list(
        &self,
        filter: &UserFilter,
        sort: UserSort,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1 = 1"));
        push_filter(&mut query, filter);
        query.push(sort.order_clause());
        query.push(" LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query
            .build_query_as::<UserRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    /// Count users matching a filter.
    pub async fn count(&self, filter: &UserFilter) -> Result<i64> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1 = 1");
        push_filter(&mut query, filter);

        let count = query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(count)
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &UserFilter) {
    if let Some(ref search) = filter.search {
        let needle = search.to_lowercase();
        query.push(" AND (instr(lower(username), ");
        query.push_bind(needle.clone());
        query.push(") > 0 OR instr(lower(full_name), ");
        query.push_bind(needle.clone());
        query.push(") > 0 OR instr(lower(email), ");
        query.push_bind(needle);
        query.push(") > 0)");
    }
    if let Some(role) = filter.role {
        query.push(" AND role = ");
        query.push_bind(role.as_str());
    }
    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ");
        query.push_bind(is_active);
    }
}

/// Internal struct for mapping database rows to User.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    full_name: String,
    bio: String,
    avatar: String,
    role: String,
    is_active: bool,
    last_login: Option<String>,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            password: self.password,
            full_name: self.full_name,
            bio: self.bio,
            avatar: self.avatar,
            role: self.role.parse().unwrap_or(Role::User),
            is_active: self.is_active,
            last_login: self.last_login,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
