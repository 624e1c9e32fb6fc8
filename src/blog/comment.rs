//! Comment model.
//!
//! A comment is either top-level (`parent_comment_id` is `None`) or a reply
//! to another comment on the same post. Replies are never stored on the
//! parent; they are assembled at read time from `parent_comment_id`.

use std::str::FromStr;

/// Longest accepted comment body, in characters.
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// Author card embedded in a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentAuthor {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
}

/// Post reference embedded in per-user and moderation listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub author: CommentAuthor,
    pub post_id: i64,
    /// Present only in listings that span several posts.
    pub post: Option<CommentPost>,
    pub parent_comment_id: Option<i64>,
    /// Visible direct replies, oldest first.
    pub replies: Vec<Comment>,
    /// Ids of users who liked the comment.
    pub likes: Vec<i64>,
    pub like_count: i64,
    pub is_approved: bool,
    pub is_spam: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_comment_id.is_some()
    }
}

/// Data for inserting a comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub author_id: i64,
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
    pub is_approved: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    pub like_count: i64,
    pub is_liked: bool,
}

/// Ordering of top-level comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentSort {
    #[default]
    Newest,
    Oldest,
    MostLiked,
}

impl CommentSort {
    pub(crate) fn order_clause(&self) -> &'static str {
        match self {
            CommentSort::Newest => " ORDER BY c.created_at DESC, c.id DESC",
            CommentSort::Oldest => " ORDER BY c.created_at ASC, c.id ASC",
            CommentSort::MostLiked => " ORDER BY c.like_count DESC, c.created_at DESC, c.id DESC",
        }
    }
}

impl FromStr for CommentSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(CommentSort::Newest),
            "oldest" => Ok(CommentSort::Oldest),
            "mostLiked" => Ok(CommentSort::MostLiked),
            _ => Err(format!("unsupported comment sort: {s}")),
        }
    }
}
