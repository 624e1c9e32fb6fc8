//! Post storage.
//!
//! Posts are read joined with their author and category. Tags live in
//! `post_tags` and are attached after the main query.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::post::{NewPost, Post, PostAuthor, PostCategory, PostFilter, PostSort, PostStatus, PostUpdate};
use crate::datetime::now_timestamp;
use crate::db::{write_error, DbPool};
use crate::{FolioError, Result};

const POST_SELECT: &str = "SELECT p.id, p.title, p.slug, p.content, p.excerpt, p.featured_image,
        p.status, p.is_featured, p.view_count, p.like_count, p.comment_count, p.published_at,
        p.seo_title, p.seo_description, p.created_at, p.updated_at,
        u.id AS author_id, u.username AS author_username, u.full_name AS author_full_name,
        u.avatar AS author_avatar, u.bio AS author_bio,
        c.id AS category_id, c.name AS category_name, c.slug AS category_slug
    FROM posts p
    JOIN users u ON u.id = p.author_id
    JOIN categories c ON c.id = p.category_id";

const POST_COUNT: &str = "SELECT COUNT(*) FROM posts p JOIN categories c ON c.id = p.category_id";

const DUPLICATE_SLUG: &str = "a post with this slug already exists";

/// Per-author post statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct AuthorStats {
    pub total_posts: i64,
    pub published_posts: i64,
    pub draft_posts: i64,
    pub archived_posts: i64,
    pub total_views: i64,
    pub total_likes: i64,
}

/// Lightweight post reference for activity feeds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostActivity {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub updated_at: String,
}

/// Repository for posts and their tags.
pub struct PostRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PostRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a post and its tags. A duplicate slug yields `Conflict`.
    pub async fn create(&self, post: &NewPost) -> Result<Post> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (title, slug, content, excerpt, featured_image, author_id, category_id,
                                status, is_featured, published_at, seo_title, seo_description,
                                created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.featured_image)
        .bind(post.author_id)
        .bind(post.category_id)
        .bind(post.status.as_str())
        .bind(post.is_featured)
        .bind(&post.published_at)
        .bind(&post.seo_title)
        .bind(&post.seo_description)
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, DUPLICATE_SLUG))?;

        replace_tags(&mut *tx, id, &post.tags).await?;
        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| FolioError::NotFound("Post".to_string()))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        self.with_tags_one(row).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE p.slug = ?"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        self.with_tags_one(row).await
    }

    /// Status and author of a post, for visibility checks that do not need
    /// the whole row.
    pub async fn get_status(&self, id: i64) -> Result<Option<(PostStatus, i64)>> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT status, author_id FROM posts WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(row.map(|(status, author_id)| (status.parse().unwrap_or_default(), author_id)))
    }

    /// Apply a partial update. Returns None if the post does not exist.
    pub async fn update(&self, id: i64, update: &PostUpdate) -> Result<Option<Post>> {
        let mut tx = self.pool.begin().await?;

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE posts SET ");
        let mut separated = query.separated(", ");
        if let Some(ref title) = update.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title);
        }
        if let Some(ref slug) = update.slug {
            separated.push("slug = ");
            separated.push_bind_unseparated(slug);
        }
        if let Some(ref content) = update.content {
            separated.push("content = ");
            separated.push_bind_unseparated(content);
        }
        if let Some(ref excerpt) = update.excerpt {
            separated.push("excerpt = ");
            separated.push_bind_unseparated(excerpt);
        }
        if let Some(ref featured_image) = update.featured_image {
            separated.push("featured_image = ");
            separated.push_bind_unseparated(featured_image);
        }
        if let Some(category_id) = update.category_id {
            separated.push("category_id = ");
            separated.push_bind_unseparated(category_id);
        }
        if let Some(status) = update.status {
            separated.push("status = ");
            separated.push_bind_unseparated(status.as_str());
        }
        if let Some(is_featured) = update.is_featured {
            separated.push("is_featured = ");
            separated.push_bind_unseparated(is_featured);
        }
        if let Some(ref published_at) = update.published_at {
            // never overwrite an existing publication date
            separated.push("published_at = COALESCE(published_at, ");
            separated.push_bind_unseparated(published_at);
            separated.push_unseparated(")");
        }
        if let Some(ref seo_title) = update.seo_title {
            separated.push("seo_title = ");
            separated.push_bind_unseparated(seo_title);
        }
        if let Some(ref seo_description) = update.seo_description {
            separated.push("seo_description = ");
            separated.push_bind_unseparated(seo_description);
        }
        separated.push("updated_at = ");
        separated.push_bind_unseparated(now_timestamp());
        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, DUPLICATE_SLUG))?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        if let Some(ref tags) = update.tags {
            replace_tags(&mut *tx, id, tags).await?;
        }
        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Delete a post. Its tags and comments cascade.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Bump the view counter without touching `updated_at`.
    pub async fn increment_views(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(())
    }

    /// List posts matching a filter.
    pub async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(POST_SELECT);
        query.push(" WHERE 1 = 1");
        push_filter(&mut query, filter);
        query.push(sort.order_clause());
        query.push(" LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query
            .build_query_as::<PostRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        self.with_tags(rows).await
    }

    /// Count posts matching a filter.
    pub async fn count(&self, filter: &PostFilter) -> Result<i64> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(POST_COUNT);
        query.push(" WHERE 1 = 1");
        push_filter(&mut query, filter);

        query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))
    }

    /// Distinct category slugs used by published posts.
    pub async fn published_category_slugs(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT DISTINCT c.slug FROM posts p JOIN categories c ON c.id = p.category_id
             WHERE p.status = 'published' ORDER BY c.slug",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))
    }

    /// Distinct tags used by published posts.
    pub async fn published_tags(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT DISTINCT t.tag FROM post_tags t JOIN posts p ON p.id = t.post_id
             WHERE p.status = 'published' ORDER BY t.tag",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))
    }

    /// Aggregate counters over one author's posts.
    pub async fn author_stats(&self, author_id: i64) -> Result<AuthorStats> {
        sqlx::query_as::<_, AuthorStats>(
            "SELECT COUNT(*) AS total_posts,
                    COALESCE(SUM(status = 'published'), 0) AS published_posts,
                    COALESCE(SUM(status = 'draft'), 0) AS draft_posts,
                    COALESCE(SUM(status = 'archived'), 0) AS archived_posts,
                    COALESCE(SUM(view_count), 0) AS total_views,
                    COALESCE(SUM(like_count), 0) AS total_likes
             FROM posts WHERE author_id = ?",
        )
        .bind(author_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))
    }

    /// An author's most recently updated posts.
    pub async fn recent_activity(&self, author_id: i64, limit: i64) -> Result<Vec<PostActivity>> {
        sqlx::query_as::<_, PostActivity>(
            "SELECT id, title, slug, status, updated_at FROM posts
             WHERE author_id = ? ORDER BY updated_at DESC, id DESC LIMIT ?",
        )
        .bind(author_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))
    }

    async fn with_tags_one(&self, row: Option<PostRow>) -> Result<Option<Post>> {
        match row {
            Some(row) => Ok(self.with_tags(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn with_tags(&self, rows: Vec<PostRow>) -> Result<Vec<Post>> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT post_id, tag FROM post_tags WHERE post_id IN (");
        let mut ids = query.separated(", ");
        for row in &rows {
            ids.push_bind(row.id);
        }
        query.push(") ORDER BY post_id, position");

        let tag_rows: Vec<(i64, String)> = query
            .build_query_as::<(i64, String)>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;

        let mut tags: HashMap<i64, Vec<String>> = HashMap::new();
        for (post_id, tag) in tag_rows {
            tags.entry(post_id).or_default().push(tag);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let post_tags = tags.remove(&row.id).unwrap_or_default();
                row.into_post(post_tags)
            })
            .collect())
    }
}

async fn replace_tags(conn: &mut SqliteConnection, post_id: i64, tags: &[String]) -> Result<()> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;

    for (position, tag) in tags.iter().enumerate() {
        sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag, position) VALUES (?, ?, ?)")
            .bind(post_id)
            .bind(tag)
            .bind(position as i64)
            .execute(&mut *conn)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
    }
    Ok(())
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &PostFilter) {
    if let Some(status) = filter.status {
        query.push(" AND p.status = ");
        query.push_bind(status.as_str());
    }
    if let Some(author_id) = filter.author_id {
        query.push(" AND p.author_id = ");
        query.push_bind(author_id);
    }
    if let Some(ref category) = filter.category {
        query.push(" AND c.slug = ");
        query.push_bind(category.to_lowercase());
    }
    if let Some(ref tag) = filter.tag {
        query.push(" AND EXISTS (SELECT 1 FROM post_tags t WHERE t.post_id = p.id AND t.tag = ");
        query.push_bind(tag.to_lowercase());
        query.push(")");
    }
    if let Some(ref search) = filter.search {
        query.push(" AND (p.id IN (SELECT rowid FROM posts_fts WHERE posts_fts MATCH ");
        query.push_bind(fts_query(search));
        query.push(") OR EXISTS (SELECT 1 FROM post_tags t WHERE t.post_id = p.id AND t.tag = ");
        query.push_bind(search.trim().to_lowercase());
        query.push("))");
    }
    if let Some(featured) = filter.featured {
        query.push(" AND p.is_featured = ");
        query.push_bind(featured);
    }
}

/// Build an FTS5 query matching any of the words in `search`.
///
/// Each word is quoted so that FTS5 operators in user input are taken
/// literally.
fn fts_query(search: &str) -> String {
    let terms: Vec<String> = search
        .split_whitespace()
        .map(|word| format!("\"{}\"", word.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        "\"\"".to_string()
    } else {
        terms.join(" OR ")
    }
}

/// Internal struct for mapping joined post rows.
#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    slug: String,
    content: String,
    excerpt: String,
    featured_image: String,
    status: String,
    is_featured: bool,
    view_count: i64,
    like_count: i64,
    comment_count: i64,
    published_at: Option<String>,
    seo_title: String,
    seo_description: String,
    created_at: String,
    updated_at: String,
    author_id: i64,
    author_username: String,
    author_full_name: String,
    author_avatar: String,
    author_bio: String,
    category_id: i64,
    category_name: String,
    category_slug: String,
}

impl PostRow {
    fn into_post(self, tags: Vec<String>) -> Post {
        Post {
            id: self.id,
            title: self.title,
            slug: self.slug,
            content: self.content,
            excerpt: self.excerpt,
            featured_image: self.featured_image,
            author: PostAuthor {
                id: self.author_id,
                username: self.author_username,
                full_name: self.author_full_name,
                avatar: self.author_avatar,
                bio: self.author_bio,
            },
            category: PostCategory {
                id: self.category_id,
                name: self.category_name,
                slug: self.category_slug,
            },
            tags,
            status: self.status.parse().unwrap_or_default(),
            is_featured: self.is_featured,
            view_count: self.view_count,
            like_count: self.like_count,
            comment_count: self.comment_count,
            published_at: self.published_at,
            seo_title: self.seo_title,
            seo_description: self.seo_description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::category::{CategoryRepository, NewCategory};
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    async fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("alice", "a@x.com", "hash", "Alice"))
            .await
            .unwrap();
        let category = CategoryRepository::new(db.pool())
            .create(&NewCategory {
                name: "Technology".to_string(),
                slug: "technology".to_string(),
                description: "Tech".to_string(),
            })
            .await
            .unwrap();
        (db, user.id, category.id)
    }

    fn new_post(author_id: i64, category_id: i64, slug: &str, status: PostStatus) -> NewPost {
        NewPost {
            title: format!("Title {slug}"),
            slug: slug.to_string(),
            content: "Rust ownership explained in detail".to_string(),
            excerpt: String::new(),
            featured_image: String::new(),
            author_id,
            category_id,
            tags: vec!["rust".to_string(), "systems".to_string()],
            status,
            is_featured: false,
            published_at: None,
            seo_title: String::new(),
            seo_description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (db, author, category) = setup().await;
        let repo = PostRepository::new(db.pool());

        let post = repo
            .create(&new_post(author, category, "first", PostStatus::Draft))
            .await
            .unwrap();
        assert_eq!(post.author.username, "alice");
        assert_eq!(post.category.slug, "technology");
        assert_eq!(post.tags, vec!["rust", "systems"]);

        let fetched = repo.get_by_slug("first").await.unwrap().unwrap();
        assert_eq!(fetched.id, post.id);
        assert!(repo.get_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let (db, author, category) = setup().await;
        let repo = PostRepository::new(db.pool());
        repo.create(&new_post(author, category, "same", PostStatus::Draft))
            .await
            .unwrap();

        let result = repo
            .create(&new_post(author, category, "same", PostStatus::Draft))
            .await;
        assert!(matches!(result, Err(FolioError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_published_at() {
        let (db, author, category) = setup().await;
        let repo = PostRepository::new(db.pool());
        let post = repo
            .create(&new_post(author, category, "p", PostStatus::Draft))
            .await
            .unwrap();

        let first = PostUpdate {
            status: Some(PostStatus::Published),
            published_at: Some("2024-01-01T00:00:00.000Z".to_string()),
            ..Default::default()
        };
        let updated = repo.update(post.id, &first).await.unwrap().unwrap();
        assert_eq!(updated.published_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));

        let second = PostUpdate {
            published_at: Some("2030-01-01T00:00:00.000Z".to_string()),
            tags: Some(vec!["go".to_string()]),
            ..Default::default()
        };
        let updated = repo.update(post.id, &second).await.unwrap().unwrap();
        assert_eq!(updated.published_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));
        assert_eq!(updated.tags, vec!["go"]);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (db, author, category) = setup().await;
        let repo = PostRepository::new(db.pool());
        repo.create(&new_post(author, category, "draft", PostStatus::Draft))
            .await
            .unwrap();
        let mut published = new_post(author, category, "live", PostStatus::Published);
        published.content = "Async runtimes and executors".to_string();
        published.tags = vec!["tokio".to_string()];
        repo.create(&published).await.unwrap();

        let only_published = PostFilter {
            status: Some(PostStatus::Published),
            ..Default::default()
        };
        assert_eq!(repo.count(&only_published).await.unwrap(), 1);
        assert_eq!(repo.count(&PostFilter::default()).await.unwrap(), 2);

        let by_tag = PostFilter {
            tag: Some("TOKIO".to_string()),
            ..Default::default()
        };
        let posts = repo.list(&by_tag, PostSort::default(), 0, 10).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "live");

        let search = PostFilter {
            search: Some("executors \"unbalanced".to_string()),
            ..Default::default()
        };
        let posts = repo.list(&search, PostSort::default(), 0, 10).await.unwrap();
        assert_eq!(posts.len(), 1);

        let by_category = PostFilter {
            category: Some("cooking".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.count(&by_category).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_distinct_lists_and_stats() {
        let (db, author, category) = setup().await;
        let repo = PostRepository::new(db.pool());
        repo.create(&new_post(author, category, "draft", PostStatus::Draft))
            .await
            .unwrap();
        let live = repo
            .create(&new_post(author, category, "live", PostStatus::Published))
            .await
            .unwrap();
        repo.increment_views(live.id).await.unwrap();
        repo.increment_views(live.id).await.unwrap();

        assert_eq!(repo.published_tags().await.unwrap(), vec!["rust", "systems"]);
        assert_eq!(
            repo.published_category_slugs().await.unwrap(),
            vec!["technology"]
        );

        let stats = repo.author_stats(author).await.unwrap();
        assert_eq!(stats.total_posts, 2);
        assert_eq!(stats.published_posts, 1);
        assert_eq!(stats.draft_posts, 1);
        assert_eq!(stats.total_views, 2);

        assert_eq!(repo.recent_activity(author, 5).await.unwrap().len(), 2);
    }

    #[test]
    fn test_fts_query_quotes_terms() {
        assert_eq!(fts_query("rust async"), "\"rust\" OR \"async\"");
        assert_eq!(fts_query("say \"hi\""), "\"say\" OR \"\"\"hi\"\"\"");
        assert_eq!(fts_query("   "), "\"\"");
    }
}
