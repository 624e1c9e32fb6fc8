//! User management handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::blog::{PostRepository, PostService, PostStatus};
use crate::db::{Role, UserFilter, UserRepository, UserSort, UserUpdate};
use crate::pagination::{Page, PageRequest};
use crate::web::dto::{
    ApiResponse, AuthorCard, AuthorPostsData, AuthorPostsQuery, Pagination, PostResponse,
    PublicUserData, PublicUserResponse, StatsResponse, UpdateUserRequest, UserData, UserListData,
    UserListQuery, UserResponse, UserStatsData, ValidatedJson, ValidatedQuery,
};
use crate::web::error::{ApiError, FieldError};
use crate::web::handlers::{parse_id, parse_sort, AppState};
use crate::web::middleware::{AdminUser, CurrentUser, MaybeUser};

/// Posts shown under "recent activity".
const RECENT_ACTIVITY_LIMIT: i64 = 5;

/// GET /api/users - Search and list accounts (admin).
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ValidatedQuery(query): ValidatedQuery<UserListQuery>,
) -> Result<Json<ApiResponse<UserListData>>, ApiError> {
    let sort: UserSort = parse_sort(query.sort.as_deref())?;
    let filter = UserFilter {
        search: query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        role: query.role.as_deref().and_then(|r| r.parse::<Role>().ok()),
        is_active: query.is_active,
    };
    let request = PageRequest::new(query.page, query.limit);

    let repo = UserRepository::new(state.db.pool());
    let users = repo
        .list(&filter, sort, request.offset(), request.limit as i64)
        .await?;
    let total = repo.count(&filter).await?;
    let page = Page::new(users, request, total);

    let pagination = Pagination::from(&page);
    Ok(Json(ApiResponse::new(
        "Users retrieved successfully",
        UserListData {
            users: page.items.into_iter().map(UserResponse::from).collect(),
            pagination,
        },
    )))
}

/// GET /api/users/:username - Public profile of an active user.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<PublicUserData>>, ApiError> {
    let user = UserRepository::new(state.db.pool())
        .get_by_username(&username)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let stats = PostRepository::new(state.db.pool())
        .author_stats(user.id)
        .await?;

    Ok(Json(ApiResponse::new(
        "User retrieved successfully",
        PublicUserData {
            user: PublicUserResponse {
                user: user.into(),
                posts_count: stats.published_posts,
                total_posts_count: stats.total_posts,
            },
        },
    )))
}

/// PUT /api/users/:id - Update an account (self, or admin for anyone).
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let id = parse_id(&id, "user")?;
    if !current.caller.can_manage(id) {
        return Err(ApiError::forbidden("Not authorized to update this user"));
    }
    if !current.caller.is_admin() && (req.role.is_some() || req.is_active.is_some()) {
        return Err(ApiError::forbidden(
            "Not authorized to update role or active status",
        ));
    }

    let repo = UserRepository::new(state.db.pool());
    let mut update = UserUpdate::new();
    if let Some(username) = req.username.map(|u| u.trim().to_string()) {
        if repo.username_exists(&username, Some(id)).await? {
            return Err(ApiError::conflict("Username already taken")
                .with_errors(vec![FieldError::new("username", "Username already taken")]));
        }
        update = update.username(username);
    }
    if let Some(full_name) = req.full_name {
        update = update.full_name(full_name.trim());
    }
    if let Some(bio) = req.bio {
        update = update.bio(bio.trim());
    }
    if let Some(avatar) = req.avatar {
        update = update.avatar(avatar.trim());
    }
    if let Some(role) = req.role.as_deref().and_then(|r| r.parse::<Role>().ok()) {
        update = update.role(role);
    }
    if let Some(is_active) = req.is_active {
        update = update.is_active(is_active);
    }

    let user = repo
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::info!(user_id = id, by = current.user.id, "User updated");

    Ok(Json(ApiResponse::new(
        "User updated successfully",
        UserData {
            user: UserResponse::from(user),
        },
    )))
}

/// DELETE /api/users/:id - Delete an account and its posts (admin).
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = parse_id(&id, "user")?;
    if id == admin.user.id {
        return Err(ApiError::bad_request("Cannot delete your own account"));
    }
    if !UserRepository::new(state.db.pool()).delete(id).await? {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(user_id = id, by = admin.user.id, "User deleted");

    Ok(Json(ApiResponse::message(
        "User and all associated posts deleted successfully",
    )))
}

/// GET /api/users/:username/posts - An author's posts.
///
/// The author and admins may ask for a `status`; published is the default.
pub async fn user_posts(
    State(state): State<Arc<AppState>>,
    MaybeUser(caller): MaybeUser,
    Path(username): Path<String>,
    ValidatedQuery(query): ValidatedQuery<AuthorPostsQuery>,
) -> Result<Json<ApiResponse<AuthorPostsData>>, ApiError> {
    let requested = query.status.as_deref().and_then(|s| s.parse::<PostStatus>().ok());
    let (author, page) = PostService::new(state.db.pool())
        .list_by_author(
            &caller,
            &username,
            requested,
            Some(PostStatus::Published),
            caller.is_admin(),
            PageRequest::new(query.page, query.limit),
        )
        .await?;

    let pagination = Pagination::from(&page);
    Ok(Json(ApiResponse::new(
        "Posts retrieved successfully",
        AuthorPostsData {
            posts: page.items.into_iter().map(PostResponse::from).collect(),
            author: AuthorCard::from(&author),
            pagination,
        },
    )))
}

/// GET /api/users/:id/stats - Writing statistics (self or admin).
pub async fn user_stats(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserStatsData>>, ApiError> {
    let id = parse_id(&id, "user")?;
    if !current.caller.can_manage(id) {
        return Err(ApiError::forbidden("Not authorized to view these statistics"));
    }
    if UserRepository::new(state.db.pool())
        .get_by_id(id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("User not found"));
    }

    let repo = PostRepository::new(state.db.pool());
    let stats = repo.author_stats(id).await?;
    let recent = repo.recent_activity(id, RECENT_ACTIVITY_LIMIT).await?;

    Ok(Json(ApiResponse::new(
        "User statistics retrieved successfully",
        UserStatsData {
            stats: StatsResponse::from(stats),
            recent_activity: recent.into_iter().map(Into::into).collect(),
        },
    )))
}
