//! Post handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::blog::{PostChanges, PostDraft, PostQuery, PostRepository, PostService, PostSort, PostStatus};
use crate::pagination::PageRequest;
use crate::web::dto::{
    ApiResponse, AuthorCard, AuthorPostsData, CategorySlugsData, CreatePostRequest,
    PostData, PostListData, PostListQuery, PageQuery, Pagination, PostResponse, TagsData,
    UpdatePostRequest, ValidatedJson, ValidatedQuery,
};
use crate::web::error::ApiError;
use crate::web::handlers::{parse_sort, AppState};
use crate::web::middleware::{CurrentUser, MaybeUser};

fn parse_status(raw: Option<String>) -> Option<PostStatus> {
    raw.and_then(|s| s.parse().ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// GET /api/posts - Published posts (any status for admins).
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    MaybeUser(caller): MaybeUser,
    ValidatedQuery(query): ValidatedQuery<PostListQuery>,
) -> Result<Json<ApiResponse<PostListData>>, ApiError> {
    let sort: PostSort = parse_sort(query.sort.as_deref())?;
    let filter = PostQuery {
        category: non_empty(query.category),
        tag: non_empty(query.tag).map(|t| t.to_lowercase()),
        search: non_empty(query.search),
        status: parse_status(query.status),
        featured: query.featured,
    };

    let page = PostService::new(state.db.pool())
        .list(&caller, filter, sort, PageRequest::new(query.page, query.limit))
        .await?;

    Ok(Json(ApiResponse::new(
        "Posts retrieved successfully",
        PostListData::from(page),
    )))
}

/// GET /api/posts/:slug - One post; counts a view.
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    MaybeUser(caller): MaybeUser,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<PostData>>, ApiError> {
    let post = PostService::new(state.db.pool()).view(&caller, &slug).await?;
    Ok(Json(ApiResponse::new(
        "Post retrieved successfully",
        PostData { post: post.into() },
    )))
}

/// POST /api/posts - Create a post.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PostData>>), ApiError> {
    let draft = PostDraft {
        title: req.title.trim().to_string(),
        content: req.content,
        category: req.category.trim().to_string(),
        slug: non_empty(req.slug),
        tags: req.tags.unwrap_or_default(),
        excerpt: non_empty(req.excerpt),
        status: parse_status(req.status),
        is_featured: req.is_featured.unwrap_or(false),
        featured_image: req.featured_image,
        seo_title: non_empty(req.seo_title),
        seo_description: non_empty(req.seo_description),
    };

    let post = PostService::new(state.db.pool())
        .create(&current.user, draft)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Post created successfully",
            PostData { post: post.into() },
        )),
    ))
}

/// PUT /api/posts/:slug - Edit a post (author or admin).
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(slug): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdatePostRequest>,
) -> Result<Json<ApiResponse<PostData>>, ApiError> {
    let changes = PostChanges {
        title: req.title.map(|t| t.trim().to_string()),
        content: req.content,
        category: non_empty(req.category),
        slug: non_empty(req.slug),
        tags: req.tags,
        excerpt: req.excerpt,
        status: parse_status(req.status),
        is_featured: req.is_featured,
        featured_image: req.featured_image,
        seo_title: req.seo_title,
        seo_description: req.seo_description,
    };

    let post = PostService::new(state.db.pool())
        .update(&current.caller, &slug, changes)
        .await?;

    Ok(Json(ApiResponse::new(
        "Post updated successfully",
        PostData { post: post.into() },
    )))
}

/// DELETE /api/posts/:slug - Delete a post and its comments.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    PostService::new(state.db.pool())
        .delete(&current.caller, &slug)
        .await?;
    Ok(Json(ApiResponse::message("Post deleted successfully")))
}

/// GET /api/posts/author/:username - An author's posts with their card.
pub async fn author_posts(
    State(state): State<Arc<AppState>>,
    MaybeUser(caller): MaybeUser,
    Path(username): Path<String>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> Result<Json<ApiResponse<AuthorPostsData>>, ApiError> {
    let (author, page) = PostService::new(state.db.pool())
        .list_by_author(&caller, &username, None, None, true, query.page_request())
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

/// GET /api/posts/categories/list - Category slugs in use by published posts.
pub async fn post_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CategorySlugsData>>, ApiError> {
    let categories = PostRepository::new(state.db.pool())
        .published_category_slugs()
        .await?;
    Ok(Json(ApiResponse::new(
        "Categories retrieved successfully",
        CategorySlugsData { categories },
    )))
}

/// GET /api/posts/tags/list - Tags in use by published posts.
pub async fn post_tags(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<TagsData>>, ApiError> {
    let tags = PostRepository::new(state.db.pool()).published_tags().await?;
    Ok(Json(ApiResponse::new(
        "Tags retrieved successfully",
        TagsData { tags },
    )))
}
