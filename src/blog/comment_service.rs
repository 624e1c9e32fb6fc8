//! Threaded comments and their moderation.
//!
//! Non-admin comments start out pending; admin comments are approved on
//! creation. Only admins change moderation flags.

use super::comment::{Comment, CommentSort, LikeToggle, NewComment, MAX_COMMENT_LENGTH};
use super::comment_repository::CommentRepository;
use super::post::PostStatus;
use super::post_repository::PostRepository;
use super::visibility::{self, CommentScope};
use crate::auth::Caller;
use crate::db::DbPool;
use crate::pagination::{Page, PageRequest};
use crate::{FolioError, Result};

/// A comment as submitted by a client.
#[derive(Debug, Clone, Default)]
pub struct CommentDraft {
    pub content: String,
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Moderation flags after an approve/reject decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moderation {
    pub id: i64,
    pub is_approved: bool,
    pub is_spam: bool,
}

pub struct CommentService<'a> {
    pool: &'a DbPool,
}

impl<'a> CommentService<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Top-level comments of a post with visible replies attached.
    pub async fn list_for_post(
        &self,
        caller: &Caller,
        post_id: i64,
        sort: CommentSort,
        page: PageRequest,
    ) -> Result<Page<Comment>> {
        match PostRepository::new(self.pool).get_status(post_id).await? {
            Some((status, author_id)) if visibility::can_view_post(caller, status, author_id) => {}
            _ => return Err(FolioError::NotFound("Post".to_string())),
        }

        let scope = CommentScope::for_caller(caller);
        let repo = CommentRepository::new(self.pool);
        let comments = repo
            .list_threads(post_id, scope, sort, page.offset(), page.limit as i64)
            .await?;
        let total = repo.count_threads(post_id, scope).await?;
        Ok(Page::new(comments, page, total))
    }

    /// Post a comment or a reply.
    pub async fn create(&self, caller: &Caller, draft: CommentDraft) -> Result<Comment> {
        let author = caller
            .user()
            .ok_or_else(|| FolioError::Auth("authentication required".to_string()))?;
        let content = validate_content(&draft.content)?;

        match PostRepository::new(self.pool).get_status(draft.post_id).await? {
            None => return Err(FolioError::NotFound("Post".to_string())),
            Some((status, _)) if status != PostStatus::Published => {
                return Err(FolioError::InvalidState(
                    "Cannot comment on unpublished post".to_string(),
                ))
            }
            Some(_) => {}
        }

        let repo = CommentRepository::new(self.pool);
        if let Some(parent_id) = draft.parent_comment_id {
            let parent = repo
                .get_by_id(parent_id)
                .await?
                .ok_or_else(|| FolioError::NotFound("Parent comment".to_string()))?;
            if parent.post_id != draft.post_id {
                return Err(FolioError::Conflict(
                    "Parent comment does not belong to this post".to_string(),
                ));
            }
        }

        let id = repo
            .create(&NewComment {
                content,
                author_id: author.id,
                post_id: draft.post_id,
                parent_comment_id: draft.parent_comment_id,
                is_approved: caller.is_admin(),
                ip_address: draft.ip_address,
                user_agent: draft.user_agent,
            })
            .await?;
        tracing::info!(
            comment_id = id,
            post_id = draft.post_id,
            parent = ?draft.parent_comment_id,
            author = %author.username,
            "Comment created"
        );

        repo.get_with_replies(id, CommentScope::for_caller(caller))
            .await?
            .ok_or_else(|| FolioError::NotFound("Comment".to_string()))
    }

    /// Edit a comment's text. Moderation state is kept as it was.
    pub async fn update(&self, caller: &Caller, id: i64, content: &str) -> Result<Comment> {
        let content = validate_content(content)?;
        let repo = CommentRepository::new(self.pool);
        self.find_managed(caller, id, "update").await?;

        repo.update_content(id, &content).await?;
        repo.get_with_replies(id, CommentScope::for_caller(caller))
            .await?
            .ok_or_else(|| FolioError::NotFound("Comment".to_string()))
    }

    /// Delete a comment and its direct replies.
    pub async fn delete(&self, caller: &Caller, id: i64) -> Result<()> {
        let comment = self.find_managed(caller, id, "delete").await?;
        let removed = CommentRepository::new(self.pool).delete(&comment).await?;
        tracing::info!(comment_id = id, post_id = comment.post_id, removed, "Comment deleted");
        Ok(())
    }

    /// Like the comment, or unlike it if the caller already did.
    pub async fn toggle_like(&self, caller: &Caller, id: i64) -> Result<LikeToggle> {
        let user_id = caller
            .id()
            .ok_or_else(|| FolioError::Auth("authentication required".to_string()))?;
        let repo = CommentRepository::new(self.pool);
        if repo.get_by_id(id).await?.is_none() {
            return Err(FolioError::NotFound("Comment".to_string()));
        }
        repo.toggle_like(id, user_id).await
    }

    /// Approve or reject a comment.
    pub async fn moderate(
        &self,
        caller: &Caller,
        id: i64,
        is_approved: bool,
        is_spam: bool,
    ) -> Result<Moderation> {
        if !caller.is_admin() {
            return Err(FolioError::Permission(
                "Access denied. Admin privileges required.".to_string(),
            ));
        }
        if !CommentRepository::new(self.pool)
            .moderate(id, is_approved, is_spam)
            .await?
        {
            return Err(FolioError::NotFound("Comment".to_string()));
        }
        tracing::info!(comment_id = id, is_approved, is_spam, "Comment moderated");
        Ok(Moderation {
            id,
            is_approved,
            is_spam,
        })
    }

    /// All comments written by one user. Only that user or an admin may look.
    pub async fn list_for_user(
        &self,
        caller: &Caller,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Comment>> {
        if !caller.can_manage(user_id) {
            return Err(FolioError::Permission(
                "Not authorized to view this user's comments".to_string(),
            ));
        }
        let repo = CommentRepository::new(self.pool);
        let comments = repo
            .list_by_author(
                user_id,
                CommentScope::for_caller(caller),
                page.offset(),
                page.limit as i64,
            )
            .await?;
        let total = repo.count_by_author(user_id).await?;
        Ok(Page::new(comments, page, total))
    }

    /// Moderation queue.
    pub async fn list_pending(&self, caller: &Caller, page: PageRequest) -> Result<Page<Comment>> {
        if !caller.is_admin() {
            return Err(FolioError::Permission(
                "Access denied. Admin privileges required.".to_string(),
            ));
        }
        let repo = CommentRepository::new(self.pool);
        let comments = repo
            .list_pending(CommentScope::Everything, page.offset(), page.limit as i64)
            .await?;
        let total = repo.count_pending().await?;
        Ok(Page::new(comments, page, total))
    }

    async fn find_managed(&self, caller: &Caller, id: i64, action: &str) -> Result<Comment> {
        let comment = CommentRepository::new(self.pool)
            .get_by_id(id)
            .await?
            .ok_or_else(|| FolioError::NotFound("Comment".to_string()))?;
        if !caller.can_manage(comment.author.id) {
            return Err(FolioError::Permission(format!(
                "Not authorized to {action} this comment"
            )));
        }
        Ok(comment)
    }
}

fn validate_content(content: &str) -> Result<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(FolioError::Validation("Comment cannot be empty".to_string()));
    }
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(FolioError::Validation(format!(
            "Comment cannot exceed {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(content.to_string())
}
