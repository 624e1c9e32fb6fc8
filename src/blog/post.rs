//! Post model.

use std::fmt;
use std::str::FromStr;

/// Words read per minute when estimating reading time.
const WORDS_PER_MINUTE: usize = 200;

pub const MAX_EXCERPT_LENGTH: usize = 300;
pub const MAX_SEO_TITLE_LENGTH: usize = 60;
pub const MAX_SEO_DESCRIPTION_LENGTH: usize = 160;

/// Publication status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "archived" => Ok(PostStatus::Archived),
            _ => Err(format!("unknown post status: {s}")),
        }
    }
}

/// Author card embedded in a post.
#[derive(Debug, Clone)]
pub struct PostAuthor {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
    pub bio: String,
}

/// Category card embedded in a post.
#[derive(Debug, Clone)]
pub struct PostCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A blog post with its author and category resolved.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: String,
    pub author: PostAuthor,
    pub category: PostCategory,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub is_featured: bool,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub published_at: Option<String>,
    pub seo_title: String,
    pub seo_description: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Estimated reading time in minutes.
    pub fn reading_time(&self) -> usize {
        reading_time(&self.content)
    }
}

/// Data for inserting a post. Defaults are already applied.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: String,
    pub author_id: i64,
    pub category_id: i64,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub is_featured: bool,
    pub published_at: Option<String>,
    pub seo_title: String,
    pub seo_description: String,
}

/// Partial post update.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category_id: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
    pub is_featured: Option<bool>,
    pub published_at: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

impl PostUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.content.is_none()
            && self.excerpt.is_none()
            && self.featured_image.is_none()
            && self.category_id.is_none()
            && self.tags.is_none()
            && self.status.is_none()
            && self.is_featured.is_none()
            && self.published_at.is_none()
            && self.seo_title.is_none()
            && self.seo_description.is_none()
    }
}

/// Filter for post listings.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Restrict to one status. `None` means every status.
    pub status: Option<PostStatus>,
    pub author_id: Option<i64>,
    /// Category slug.
    pub category: Option<String>,
    /// Exact (lowercased) tag.
    pub tag: Option<String>,
    /// Full-text query over title, content and excerpt.
    pub search: Option<String>,
    pub featured: Option<bool>,
}

/// Sort order for post listings, parsed from `field` or `-field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostSort {
    column: &'static str,
    descending: bool,
}

impl Default for PostSort {
    fn default() -> Self {
        Self {
            column: "published_at",
            descending: true,
        }
    }
}

impl FromStr for PostSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, field) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let column = match field {
            "publishedAt" => "published_at",
            "createdAt" => "created_at",
            "updatedAt" => "updated_at",
            "viewCount" => "view_count",
            "likeCount" => "like_count",
            "commentCount" => "comment_count",
            "title" => "title",
            _ => return Err(format!("unsupported sort field: {field}")),
        };
        Ok(Self { column, descending })
    }
}

impl PostSort {
    pub(crate) fn order_clause(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!(" ORDER BY p.{} {direction}, p.id {direction}", self.column)
    }
}

/// Turn arbitrary text into a URL slug.
///
/// Lowercases, drops everything but ASCII letters, digits, spaces and
/// hyphens, then joins the remaining words with single hyphens.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    kept.split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Minutes needed to read `content`, never less than one.
pub fn reading_time(content: &str) -> usize {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

/// Lowercase, trim and de-duplicate tags, keeping first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
