//! Post categories.

use sqlx::{QueryBuilder, Sqlite};

use crate::datetime::now_timestamp;
use crate::db::{write_error, DbPool};
use crate::{FolioError, Result};

/// A category posts are filed under.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: String,
}

/// Partial category update.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

impl CategoryUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.slug.is_none() && self.description.is_none()
    }
}

const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at, updated_at";
const DUPLICATE_CATEGORY: &str = "category name or slug already exists";

/// Repository for category CRUD operations.
pub struct CategoryRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a category. Duplicate names or slugs yield `Conflict`.
    pub async fn create(&self, category: &NewCategory) -> Result<Category> {
        let now = now_timestamp();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO categories (name, slug, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&now)
        .bind(&now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| write_error(e, DUPLICATE_CATEGORY))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| FolioError::NotFound("Category".to_string()))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))
    }

    /// Find a category by slug, or failing that by (case-insensitive) name.
    pub async fn find_by_slug_or_name(&self, key: &str) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories
             WHERE slug = lower(?1) OR name = ?1
             ORDER BY slug = lower(?1) DESC LIMIT 1"
        ))
        .bind(key.trim())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))
    }

    /// All categories, newest first.
    pub async fn list(&self) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))
    }

    /// Update a category. Returns None if it does not exist.
    pub async fn update(&self, id: i64, update: &CategoryUpdate) -> Result<Option<Category>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE categories SET ");
        let mut separated = query.separated(", ");
        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }
        if let Some(ref slug) = update.slug {
            separated.push("slug = ");
            separated.push_bind_unseparated(slug);
        }
        if let Some(ref description) = update.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
        }
        separated.push("updated_at = ");
        separated.push_bind_unseparated(now_timestamp());
        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| write_error(e, DUPLICATE_CATEGORY))?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete a category.
    ///
    /// Fails with `Conflict` while posts are still filed under it. Returns
    /// false if it does not exist.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE category_id = ?")
            .bind(id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        if in_use > 0 {
            return Err(FolioError::Conflict(format!(
                "category is used by {in_use} post(s)"
            )));
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}
