//! Contact message storage.

use std::str::FromStr;

use sqlx::{QueryBuilder, Sqlite};

use crate::datetime::now_timestamp;
use crate::db::DbPool;
use crate::{FolioError, Result};

/// A message left through the contact form.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl ContactUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.message.is_none()
    }
}

/// Sort order for the contact inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactSort {
    column: &'static str,
    descending: bool,
}

impl Default for ContactSort {
    fn default() -> Self {
        Self {
            column: "created_at",
            descending: true,
        }
    }
}

impl ContactSort {
    /// Build from a field name and an `asc`/`desc` order. Anything but
    /// `asc` sorts descending.
    pub fn new(field: Option<&str>, order: Option<&str>) -> std::result::Result<Self, String> {
        let column = match field {
            None => "created_at",
            Some(field) => parse_column(field)?,
        };
        let descending = !matches!(order, Some(o) if o.eq_ignore_ascii_case("asc"));
        Ok(Self { column, descending })
    }

    fn order_clause(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!(" ORDER BY {} {direction}, id {direction}", self.column)
    }
}

impl FromStr for ContactSort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(Some(s), None)
    }
}

fn parse_column(field: &str) -> std::result::Result<&'static str, String> {
    match field {
        "createdAt" => Ok("created_at"),
        "name" => Ok("name"),
        "email" => Ok("email"),
        _ => Err(format!("unsupported sort field: {field}")),
    }
}

const CONTACT_COLUMNS: &str = "id, name, email, message, created_at, updated_at";

pub struct ContactRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ContactRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, contact: &NewContact) -> Result<Contact> {
        let now = now_timestamp();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO contacts (name, email, message, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.message)
        .bind(&now)
        .bind(&now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| FolioError::NotFound("Contact".to_string()))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Contact>> {
        sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))
    }

    pub async fn list(&self, sort: ContactSort, offset: i64, limit: i64) -> Result<Vec<Contact>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {CONTACT_COLUMNS} FROM contacts"));
        query.push(sort.order_clause());
        query.push(" LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        query
            .build_query_as::<Contact>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))
    }

    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
            .fetch_one(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))
    }

    /// Returns None if the message does not exist.
    pub async fn update(&self, id: i64, update: &ContactUpdate) -> Result<Option<Contact>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE contacts SET ");
        let mut separated = query.separated(", ");
        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }
        if let Some(ref email) = update.email {
            separated.push("email = ");
            separated.push_bind_unseparated(email);
        }
        if let Some(ref message) = update.message {
            separated.push("message = ");
            separated.push_bind_unseparated(message);
        }
        separated.push("updated_at = ");
        separated.push_bind_unseparated(now_timestamp());
        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn message(name: &str, email: &str) -> NewContact {
        NewContact {
            name: name.to_string(),
            email: email.to_string(),
            message: "Hello there".to_string(),
        }
    }

    #[tokio::test]
    async fn test_crud() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ContactRepository::new(db.pool());

        let created = repo.create(&message("Ann", "ann@x.com")).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);

        let update = ContactUpdate {
            message: Some("Updated".to_string()),
            ..Default::default()
        };
        let updated = repo.update(created.id, &update).await.unwrap().unwrap();
        assert_eq!(updated.message, "Updated");
        assert_eq!(updated.name, "Ann");
        assert!(repo.update(999, &update).await.unwrap().is_none());

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_sorting() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ContactRepository::new(db.pool());
        repo.create(&message("Zed", "z@x.com")).await.unwrap();
        repo.create(&message("Amy", "a@x.com")).await.unwrap();

        let sort = ContactSort::new(Some("name"), Some("asc")).unwrap();
        let names: Vec<_> = repo
            .list(sort, 0, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Amy", "Zed"]);

        let newest: Vec<_> = repo
            .list(ContactSort::default(), 0, 1)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(newest, vec!["Amy"]);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(ContactSort::new(None, None).unwrap(), ContactSort::default());
        assert!(ContactSort::new(Some("message"), None).is_err());
        assert!("email".parse::<ContactSort>().is_ok());
    }
}
