//! Comment handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::blog::{CommentDraft, CommentService, CommentSort};
use crate::pagination::PageRequest;
use crate::web::dto::{
    ApiResponse, ApproveCommentRequest, CommentData, CommentListData, CommentListQuery,
    CreateCommentRequest, LikeResponse, ModerationData, ModerationResponse, PageQuery,
    UpdateCommentRequest, ValidatedJson, ValidatedQuery,
};
use crate::web::error::ApiError;
use crate::web::handlers::{parse_id, AppState};
use crate::web::middleware::{AdminUser, ClientInfo, CurrentUser, MaybeUser};

/// GET /api/comments/post/:postId - Threads of a post.
pub async fn list_post_comments(
    State(state): State<Arc<AppState>>,
    MaybeUser(caller): MaybeUser,
    Path(post_id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<CommentListQuery>,
) -> Result<Json<ApiResponse<CommentListData>>, ApiError> {
    let post_id = parse_id(&post_id, "post")?;
    // Unknown values fall back to newest first.
    let sort = query
        .sort
        .as_deref()
        .and_then(|raw| raw.trim().parse::<CommentSort>().ok())
        .unwrap_or_default();

    let page = CommentService::new(state.db.pool())
        .list_for_post(&caller, post_id, sort, PageRequest::new(query.page, query.limit))
        .await?;

    Ok(Json(ApiResponse::new(
        "Comments retrieved successfully",
        CommentListData::from(page),
    )))
}

/// POST /api/comments - Comment on a post, or reply to a comment.
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CommentData>>), ApiError> {
    let draft = CommentDraft {
        content: req.content,
        post_id: req.post_id,
        parent_comment_id: req.parent_comment_id,
        ip_address: client.ip,
        user_agent: client.user_agent,
    };

    let comment = CommentService::new(state.db.pool())
        .create(&current.caller, draft)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Comment created successfully",
            CommentData {
                comment: comment.into(),
            },
        )),
    ))
}

/// PUT /api/comments/:id - Edit a comment (author or admin).
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateCommentRequest>,
) -> Result<Json<ApiResponse<CommentData>>, ApiError> {
    let id = parse_id(&id, "comment")?;
    let comment = CommentService::new(state.db.pool())
        .update(&current.caller, id, &req.content)
        .await?;

    Ok(Json(ApiResponse::new(
        "Comment updated successfully",
        CommentData {
            comment: comment.into(),
        },
    )))
}

/// DELETE /api/comments/:id - Delete a comment and its replies.
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = parse_id(&id, "comment")?;
    CommentService::new(state.db.pool())
        .delete(&current.caller, id)
        .await?;
    Ok(Json(ApiResponse::message("Comment deleted successfully")))
}

/// POST /api/comments/:id/like - Toggle the caller's like.
pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<LikeResponse>>, ApiError> {
    let id = parse_id(&id, "comment")?;
    let toggle = CommentService::new(state.db.pool())
        .toggle_like(&current.caller, id)
        .await?;

    let message = if toggle.is_liked {
        "Comment liked"
    } else {
        "Comment unliked"
    };
    Ok(Json(ApiResponse::new(
        message,
        LikeResponse {
            like_count: toggle.like_count,
            is_liked: toggle.is_liked,
        },
    )))
}

/// PUT /api/comments/:id/approve - Moderate a comment (admin).
pub async fn approve_comment(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ApproveCommentRequest>,
) -> Result<Json<ApiResponse<ModerationData>>, ApiError> {
    let id = parse_id(&id, "comment")?;
    let outcome = CommentService::new(state.db.pool())
        .moderate(&admin.caller, id, req.is_approved, req.is_spam)
        .await?;

    let message = if outcome.is_approved {
        "Comment approved"
    } else {
        "Comment rejected"
    };
    Ok(Json(ApiResponse::new(
        message,
        ModerationData {
            comment: ModerationResponse {
                id: outcome.id,
                is_approved: outcome.is_approved,
                is_spam: outcome.is_spam,
            },
        },
    )))
}

/// GET /api/comments/user/:userId - A user's comments (self or admin).
pub async fn user_comments(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(user_id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> Result<Json<ApiResponse<CommentListData>>, ApiError> {
    let user_id = parse_id(&user_id, "user")?;
    let page = CommentService::new(state.db.pool())
        .list_for_user(&current.caller, user_id, query.page_request())
        .await?;

    Ok(Json(ApiResponse::new(
        "Comments retrieved successfully",
        CommentListData::from(page),
    )))
}

/// GET /api/comments/admin/pending - Moderation queue (admin).
pub async fn pending_comments(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> Result<Json<ApiResponse<CommentListData>>, ApiError> {
    let page = CommentService::new(state.db.pool())
        .list_pending(&admin.caller, query.page_request())
        .await?;

    Ok(Json(ApiResponse::new(
        "Pending comments retrieved successfully",
        CommentListData::from(page),
    )))
}
