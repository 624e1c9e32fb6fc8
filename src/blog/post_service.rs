//! Post operations with visibility and ownership rules applied.

use super::category::CategoryRepository;
use super::post::{
    normalize_tags, slugify, truncate_chars, NewPost, Post, PostFilter, PostSort, PostStatus,
    PostUpdate, MAX_EXCERPT_LENGTH, MAX_SEO_DESCRIPTION_LENGTH, MAX_SEO_TITLE_LENGTH,
};
use super::post_repository::PostRepository;
use super::visibility;
use crate::auth::Caller;
use crate::datetime::now_timestamp;
use crate::db::{DbPool, User, UserRepository};
use crate::pagination::{Page, PageRequest};
use crate::{FolioError, Result};

/// Fields supplied when creating a post.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    /// Category slug or name.
    pub category: String,
    pub slug: Option<String>,
    pub tags: Vec<String>,
    pub excerpt: Option<String>,
    pub status: Option<PostStatus>,
    pub is_featured: bool,
    pub featured_image: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

/// Fields supplied when editing a post. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub slug: Option<String>,
    pub tags: Option<Vec<String>>,
    pub excerpt: Option<String>,
    pub status: Option<PostStatus>,
    pub is_featured: Option<bool>,
    pub featured_image: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

/// Listing filters as requested by a client, before visibility is applied.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub status: Option<PostStatus>,
    pub featured: Option<bool>,
}

pub struct PostService<'a> {
    pool: &'a DbPool,
}

impl<'a> PostService<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// List posts visible to the caller.
    pub async fn list(
        &self,
        caller: &Caller,
        query: PostQuery,
        sort: PostSort,
        page: PageRequest,
    ) -> Result<Page<Post>> {
        let filter = PostFilter {
            status: visibility::listing_status(caller, query.status),
            author_id: None,
            category: query.category,
            tag: query.tag,
            search: query.search.filter(|s| !s.trim().is_empty()),
            featured: query.featured,
        };

        let repo = PostRepository::new(self.pool);
        let posts = repo
            .list(&filter, sort, page.offset(), page.limit as i64)
            .await?;
        let total = repo.count(&filter).await?;
        Ok(Page::new(posts, page, total))
    }

    /// Fetch a post for reading and count the view.
    ///
    /// Posts the caller may not see are reported as missing.
    pub async fn view(&self, caller: &Caller, slug: &str) -> Result<Post> {
        let repo = PostRepository::new(self.pool);
        let mut post = repo
            .get_by_slug(slug)
            .await?
            .filter(|p| visibility::can_view_post(caller, p.status, p.author.id))
            .ok_or_else(|| FolioError::NotFound("Post".to_string()))?;

        repo.increment_views(post.id).await?;
        post.view_count += 1;
        Ok(post)
    }

    /// Create a post owned by `author`.
    pub async fn create(&self, author: &User, draft: PostDraft) -> Result<Post> {
        let category = self.resolve_category(&draft.category).await?;
        let status = draft.status.unwrap_or_default();

        let excerpt = match draft.excerpt.filter(|e| !e.is_empty()) {
            Some(excerpt) => excerpt,
            None => truncate_chars(&draft.content, MAX_EXCERPT_LENGTH),
        };
        let seo_title = truncate_chars(
            draft
                .seo_title
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(&draft.title),
            MAX_SEO_TITLE_LENGTH,
        );
        let seo_description = truncate_chars(
            draft
                .seo_description
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(&excerpt),
            MAX_SEO_DESCRIPTION_LENGTH,
        );

        let new_post = NewPost {
            slug: make_slug(draft.slug.as_deref().unwrap_or(&draft.title)),
            title: draft.title,
            content: draft.content,
            excerpt,
            featured_image: draft.featured_image.unwrap_or_default(),
            author_id: author.id,
            category_id: category,
            tags: normalize_tags(&draft.tags),
            status,
            is_featured: draft.is_featured,
            published_at: (status == PostStatus::Published).then(now_timestamp),
            seo_title,
            seo_description,
        };

        let post = PostRepository::new(self.pool).create(&new_post).await?;
        tracing::info!(post_id = post.id, slug = %post.slug, author = %author.username, "Post created");
        Ok(post)
    }

    /// Edit a post. Only its author or an admin may do this.
    pub async fn update(&self, caller: &Caller, slug: &str, changes: PostChanges) -> Result<Post> {
        let repo = PostRepository::new(self.pool);
        let post = self.find_managed(caller, slug, "update").await?;

        let category_id = match changes.category {
            Some(ref key) => Some(self.resolve_category(key).await?),
            None => None,
        };
        let update = PostUpdate {
            title: changes.title,
            slug: changes.slug.as_deref().map(make_slug),
            content: changes.content,
            excerpt: changes.excerpt,
            featured_image: changes.featured_image,
            category_id,
            tags: changes.tags.as_deref().map(normalize_tags),
            status: changes.status,
            is_featured: changes.is_featured,
            // only takes effect if the post was never published
            published_at: (changes.status == Some(PostStatus::Published)).then(now_timestamp),
            seo_title: changes.seo_title,
            seo_description: changes.seo_description,
        };

        let updated = repo
            .update(post.id, &update)
            .await?
            .ok_or_else(|| FolioError::NotFound("Post".to_string()))?;
        tracing::info!(post_id = updated.id, slug = %updated.slug, "Post updated");
        Ok(updated)
    }

    /// Delete a post together with its comments.
    pub async fn delete(&self, caller: &Caller, slug: &str) -> Result<()> {
        let post = self.find_managed(caller, slug, "delete").await?;
        PostRepository::new(self.pool).delete(post.id).await?;
        tracing::info!(post_id = post.id, slug = %post.slug, "Post deleted");
        Ok(())
    }

    /// Posts by one author. Drafts and archived posts are only listed for
    /// the author and admins.
    ///
    /// `fallback` is the status the author/admin sees when none is
    /// requested. Inactive authors are hidden unless `include_inactive`.
    pub async fn list_by_author(
        &self,
        caller: &Caller,
        username: &str,
        requested: Option<PostStatus>,
        fallback: Option<PostStatus>,
        include_inactive: bool,
        page: PageRequest,
    ) -> Result<(User, Page<Post>)> {
        let author = UserRepository::new(self.pool)
            .get_by_username(username)
            .await?
            .filter(|u| include_inactive || u.is_active)
            .ok_or_else(|| FolioError::NotFound("User".to_string()))?;

        let filter = PostFilter {
            status: visibility::author_listing_status(caller, author.id, requested, fallback),
            author_id: Some(author.id),
            ..Default::default()
        };
        let repo = PostRepository::new(self.pool);
        let posts = repo
            .list(&filter, PostSort::default(), page.offset(), page.limit as i64)
            .await?;
        let total = repo.count(&filter).await?;
        Ok((author, Page::new(posts, page, total)))
    }

    async fn find_managed(&self, caller: &Caller, slug: &str, action: &str) -> Result<Post> {
        let post = PostRepository::new(self.pool)
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| FolioError::NotFound("Post".to_string()))?;
        if !caller.can_manage(post.author.id) {
            return Err(FolioError::Permission(format!(
                "Not authorized to {action} this post"
            )));
        }
        Ok(post)
    }

    async fn resolve_category(&self, key: &str) -> Result<i64> {
        CategoryRepository::new(self.pool)
            .find_by_slug_or_name(key)
            .await?
            .map(|c| c.id)
            .ok_or_else(|| FolioError::Validation(format!("Category '{key}' does not exist")))
    }
}

/// Slugify, falling back to a random slug when nothing usable remains.
fn make_slug(source: &str) -> String {
    let slug = slugify(source);
    if slug.is_empty() {
        let id = uuid::Uuid::new_v4().simple().to_string();
        format!("post-{}", &id[..8])
    } else {
        slug
    }
}
