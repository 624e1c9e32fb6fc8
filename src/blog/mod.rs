//! Blog content: categories, posts and threaded comments.

pub mod category;
pub mod comment;
mod comment_repository;
mod comment_service;
pub mod post;
mod post_repository;
mod post_service;
pub mod visibility;

pub use category::{Category, CategoryRepository, CategoryUpdate, NewCategory};
pub use comment::{Comment, CommentAuthor, CommentPost, CommentSort, LikeToggle, NewComment};
pub use comment_repository::CommentRepository;
pub use comment_service::{CommentDraft, CommentService, Moderation};
pub use post::{slugify, Post, PostAuthor, PostCategory, PostSort, PostStatus};
pub use post_repository::{AuthorStats, PostActivity, PostRepository};
pub use post_service::{PostChanges, PostDraft, PostQuery, PostService};
pub use visibility::CommentScope;
