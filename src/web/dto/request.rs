//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use super::validation::{not_empty_trimmed, post_status, tag_list, user_role, username_chars};
use crate::pagination::PageRequest;

// ============================================================================
// Auth
// ============================================================================

/// User registration request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 30, message = "Username must be between 3 and 30 characters"),
        custom(function = "username_chars")
    )]
    pub username: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be at least 6 characters long"
    ))]
    pub password: String,
    #[validate(length(min = 2, max = 100, message = "Full name must be between 2 and 100 characters"))]
    pub full_name: String,
    #[validate(length(max = 500, message = "Bio cannot exceed 500 characters"))]
    pub bio: Option<String>,
}

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile update for the current user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100, message = "Full name must be between 2 and 100 characters"))]
    pub full_name: Option<String>,
    #[validate(length(max = 500, message = "Bio cannot exceed 500 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 500, message = "Avatar URL cannot exceed 500 characters"))]
    pub avatar: Option<String>,
}

/// Password change request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "New password must be at least 6 characters long"
    ))]
    pub new_password: String,
}

/// Query parameters Google sends back to the callback.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// ============================================================================
// Pagination
// ============================================================================

/// Plain `page`/`limit` query.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

// ============================================================================
// Posts
// ============================================================================

/// Post listing filters.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PostListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub tag: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Search query must be between 1 and 100 characters"))]
    pub search: Option<String>,
    #[validate(custom(function = "post_status"))]
    pub status: Option<String>,
    pub featured: Option<bool>,
    pub sort: Option<String>,
}

/// Filters for an author's post listing.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AuthorPostsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[validate(custom(function = "post_status"))]
    pub status: Option<String>,
}

/// New post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(
        length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub title: String,
    #[validate(length(min = 10, message = "Content must be at least 10 characters long"))]
    pub content: String,
    #[validate(length(min = 1, max = 50, message = "Category must be between 1 and 50 characters"))]
    pub category: String,
    #[validate(length(max = 200, message = "Slug cannot exceed 200 characters"))]
    pub slug: Option<String>,
    #[validate(custom(function = "tag_list"))]
    pub tags: Option<Vec<String>>,
    #[validate(length(max = 300, message = "Excerpt cannot exceed 300 characters"))]
    pub excerpt: Option<String>,
    #[validate(custom(function = "post_status"))]
    pub status: Option<String>,
    pub is_featured: Option<bool>,
    pub featured_image: Option<String>,
    #[validate(length(max = 60, message = "SEO title cannot exceed 60 characters"))]
    pub seo_title: Option<String>,
    #[validate(length(max = 160, message = "SEO description cannot exceed 160 characters"))]
    pub seo_description: Option<String>,
}

/// Partial post update.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[validate(
        length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub title: Option<String>,
    #[validate(length(min = 10, message = "Content must be at least 10 characters long"))]
    pub content: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Category must be between 1 and 50 characters"))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Slug must be between 1 and 200 characters"))]
    pub slug: Option<String>,
    #[validate(custom(function = "tag_list"))]
    pub tags: Option<Vec<String>>,
    #[validate(length(max = 300, message = "Excerpt cannot exceed 300 characters"))]
    pub excerpt: Option<String>,
    #[validate(custom(function = "post_status"))]
    pub status: Option<String>,
    pub is_featured: Option<bool>,
    pub featured_image: Option<String>,
    #[validate(length(max = 60, message = "SEO title cannot exceed 60 characters"))]
    pub seo_title: Option<String>,
    #[validate(length(max = 160, message = "SEO description cannot exceed 160 characters"))]
    pub seo_description: Option<String>,
}

// ============================================================================
// Comments
// ============================================================================

/// Comment listing query.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CommentListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
}

/// New comment or reply.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(
        length(min = 1, max = 1000, message = "Comment must be between 1 and 1000 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub content: String,
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
}

/// Comment edit.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(
        length(min = 1, max = 1000, message = "Comment must be between 1 and 1000 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub content: String,
}

/// Moderation decision.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApproveCommentRequest {
    pub is_approved: bool,
    #[serde(default)]
    pub is_spam: bool,
}

// ============================================================================
// Users
// ============================================================================

/// Admin user listing query.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[validate(length(max = 100, message = "Search query cannot exceed 100 characters"))]
    pub search: Option<String>,
    #[validate(custom(function = "user_role"))]
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub sort: Option<String>,
}

/// User update (self or admin).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 100, message = "Full name must be between 2 and 100 characters"))]
    pub full_name: Option<String>,
    #[validate(length(max = 500, message = "Bio cannot exceed 500 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 500, message = "Avatar URL cannot exceed 500 characters"))]
    pub avatar: Option<String>,
    #[validate(
        length(min = 3, max = 30, message = "Username must be between 3 and 30 characters"),
        custom(function = "username_chars")
    )]
    pub username: Option<String>,
    #[validate(custom(function = "user_role"))]
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

// ============================================================================
// Categories
// ============================================================================

/// New category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(
        length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub name: String,
    #[validate(length(min = 1, max = 500, message = "Description must be between 1 and 500 characters"))]
    pub description: String,
    #[validate(length(max = 60, message = "Slug cannot exceed 60 characters"))]
    pub slug: Option<String>,
}

/// Partial category update.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(
        length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 500, message = "Description must be between 1 and 500 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 60, message = "Slug must be between 1 and 60 characters"))]
    pub slug: Option<String>,
}

// ============================================================================
// Contact
// ============================================================================

/// Contact form submission.
#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(
        length(min = 1, max = 2000, message = "Message must be between 1 and 2000 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub message: String,
}

/// Partial contact message update.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateContactRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 2000, message = "Message must be between 1 and 2000 characters"))]
    pub message: Option<String>,
}

/// Contact inbox listing query.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ContactListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// Normalise an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
