//! Response DTOs for Web API.

use serde::Serialize;

use crate::blog::{AuthorStats, Category, Comment, Post, PostActivity};
use crate::contact::Contact;
use crate::datetime::now_timestamp;
use crate::pagination::Page;
use crate::User;

// ============================================================================
// Envelope
// ============================================================================

/// Success envelope: `{success, message, timestamp, data?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a response carrying data.
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            timestamp: now_timestamp(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Create a response with a message only.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            timestamp: now_timestamp(),
            data: None,
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl<T> From<&Page<T>> for Pagination {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            pages: page.pages(),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// User representation. Never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub bio: String,
    pub avatar: String,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            bio: user.bio,
            avatar: user.avatar,
            role: user.role.as_str().to_string(),
            is_active: user.is_active,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// `{token, user}` returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// `{user}` wrapper.
#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: UserResponse,
}

/// Public profile with post counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub posts_count: i64,
    pub total_posts_count: i64,
}

/// `{user}` wrapper for a public profile.
#[derive(Debug, Serialize)]
pub struct PublicUserData {
    pub user: PublicUserResponse,
}

/// `{users, pagination}`.
#[derive(Debug, Serialize)]
pub struct UserListData {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

/// Author statistics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_posts: i64,
    pub published_posts: i64,
    pub draft_posts: i64,
    pub archived_posts: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub average_views: i64,
    pub average_likes: i64,
}

impl From<AuthorStats> for StatsResponse {
    fn from(stats: AuthorStats) -> Self {
        let average = |sum: i64| {
            if stats.total_posts == 0 {
                0
            } else {
                (sum as f64 / stats.total_posts as f64).round() as i64
            }
        };
        Self {
            average_views: average(stats.total_views),
            average_likes: average(stats.total_likes),
            total_posts: stats.total_posts,
            published_posts: stats.published_posts,
            draft_posts: stats.draft_posts,
            archived_posts: stats.archived_posts,
            total_views: stats.total_views,
            total_likes: stats.total_likes,
        }
    }
}

/// Recently updated post.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub updated_at: String,
}

impl From<PostActivity> for ActivityResponse {
    fn from(a: PostActivity) -> Self {
        Self {
            id: a.id,
            title: a.title,
            slug: a.slug,
            status: a.status,
            updated_at: a.updated_at,
        }
    }
}

/// `{stats, recentActivity}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsData {
    pub stats: StatsResponse,
    pub recent_activity: Vec<ActivityResponse>,
}

// ============================================================================
// Posts
// ============================================================================

/// Post author summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthorResponse {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
}

/// Post category summary.
#[derive(Debug, Serialize)]
pub struct PostCategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Full post.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: String,
    pub author: PostAuthorResponse,
    pub category: PostCategoryResponse,
    pub tags: Vec<String>,
    pub status: String,
    pub is_featured: bool,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub reading_time: usize,
    pub published_at: Option<String>,
    pub seo_title: String,
    pub seo_description: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        let reading_time = post.reading_time();
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            featured_image: post.featured_image,
            author: PostAuthorResponse {
                id: post.author.id,
                username: post.author.username,
                full_name: post.author.full_name,
                avatar: post.author.avatar,
            },
            category: PostCategoryResponse {
                id: post.category.id,
                name: post.category.name,
                slug: post.category.slug,
            },
            tags: post.tags,
            status: post.status.as_str().to_string(),
            is_featured: post.is_featured,
            view_count: post.view_count,
            like_count: post.like_count,
            comment_count: post.comment_count,
            reading_time,
            published_at: post.published_at,
            seo_title: post.seo_title,
            seo_description: post.seo_description,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// `{post}` wrapper.
#[derive(Debug, Serialize)]
pub struct PostData {
    pub post: PostResponse,
}

/// `{posts, pagination}`.
#[derive(Debug, Serialize)]
pub struct PostListData {
    pub posts: Vec<PostResponse>,
    pub pagination: Pagination,
}

impl From<Page<Post>> for PostListData {
    fn from(page: Page<Post>) -> Self {
        let pagination = Pagination::from(&page);
        Self {
            posts: page.items.into_iter().map(PostResponse::from).collect(),
            pagination,
        }
    }
}

/// Author card shown above an author's posts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorCard {
    pub username: String,
    pub full_name: String,
    pub avatar: String,
    pub bio: String,
}

impl From<&User> for AuthorCard {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            bio: user.bio.clone(),
        }
    }
}

/// `{posts, author, pagination}`.
#[derive(Debug, Serialize)]
pub struct AuthorPostsData {
    pub posts: Vec<PostResponse>,
    pub author: AuthorCard,
    pub pagination: Pagination,
}

/// `{categories}` of published posts (slugs).
#[derive(Debug, Serialize)]
pub struct CategorySlugsData {
    pub categories: Vec<String>,
}

/// `{tags}` of published posts.
#[derive(Debug, Serialize)]
pub struct TagsData {
    pub tags: Vec<String>,
}

// ============================================================================
// Comments
// ============================================================================

/// Comment author summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthorResponse {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
}

/// Post summary attached to a user's comment listing.
#[derive(Debug, Serialize)]
pub struct CommentPostResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

/// Comment with its assembled replies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub content: String,
    pub author: CommentAuthorResponse,
    pub post_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<CommentPostResponse>,
    pub parent_comment: Option<i64>,
    pub replies: Vec<CommentResponse>,
    pub likes: Vec<i64>,
    pub like_count: i64,
    pub is_approved: bool,
    pub is_spam: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            author: CommentAuthorResponse {
                id: comment.author.id,
                username: comment.author.username,
                full_name: comment.author.full_name,
                avatar: comment.author.avatar,
            },
            post_id: comment.post_id,
            post: comment.post.map(|p| CommentPostResponse {
                id: p.id,
                title: p.title,
                slug: p.slug,
            }),
            parent_comment: comment.parent_comment_id,
            replies: comment
                .replies
                .into_iter()
                .map(CommentResponse::from)
                .collect(),
            likes: comment.likes,
            like_count: comment.like_count,
            is_approved: comment.is_approved,
            is_spam: comment.is_spam,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

/// `{comment}` wrapper.
#[derive(Debug, Serialize)]
pub struct CommentData {
    pub comment: CommentResponse,
}

/// `{comments, pagination}`.
#[derive(Debug, Serialize)]
pub struct CommentListData {
    pub comments: Vec<CommentResponse>,
    pub pagination: Pagination,
}

impl From<Page<Comment>> for CommentListData {
    fn from(page: Page<Comment>) -> Self {
        let pagination = Pagination::from(&page);
        Self {
            comments: page.items.into_iter().map(CommentResponse::from).collect(),
            pagination,
        }
    }
}

/// Like toggle result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub like_count: i64,
    pub is_liked: bool,
}

/// Moderation result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResponse {
    pub id: i64,
    pub is_approved: bool,
    pub is_spam: bool,
}

/// `{comment: {id, isApproved, isSpam}}`.
#[derive(Debug, Serialize)]
pub struct ModerationData {
    pub comment: ModerationResponse,
}

// ============================================================================
// Categories
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

// ============================================================================
// Contact
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Contact> for ContactResponse {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            message: c.message,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// `{contacts, pagination}`.
#[derive(Debug, Serialize)]
pub struct ContactListData {
    pub contacts: Vec<ContactResponse>,
    pub pagination: Pagination,
}

// ============================================================================
// Misc
// ============================================================================

/// Uploaded image location.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Liveness probe payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
