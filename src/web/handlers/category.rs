//! Category handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::blog::{slugify, CategoryRepository, CategoryUpdate, NewCategory};
use crate::web::dto::{
    ApiResponse, CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::{parse_id, AppState};
use crate::web::middleware::AdminUser;

fn category_slug(source: &str) -> Result<String, ApiError> {
    let slug = slugify(source);
    if slug.is_empty() {
        return Err(ApiError::bad_request(
            "Slug must contain at least one letter or digit",
        ));
    }
    Ok(slug)
}

/// GET /api/categories - All categories, newest first.
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CategoryResponse>>>, ApiError> {
    let categories = CategoryRepository::new(state.db.pool()).list().await?;
    Ok(Json(ApiResponse::new(
        "Categories fetched successfully",
        categories.into_iter().map(CategoryResponse::from).collect(),
    )))
}

/// POST /api/categories - Create a category (admin).
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ValidatedJson(req): ValidatedJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ApiError> {
    let name = req.name.trim().to_string();
    let slug = match req.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => category_slug(slug)?,
        None => category_slug(&name)?,
    };

    let category = CategoryRepository::new(state.db.pool())
        .create(&NewCategory {
            name,
            slug,
            description: req.description.trim().to_string(),
        })
        .await?;

    tracing::info!(category_id = category.id, slug = %category.slug, by = admin.user.id, "Category created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Category created successfully",
            CategoryResponse::from(category),
        )),
    ))
}

/// PUT /api/categories/:id - Update a category (admin).
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryResponse>>, ApiError> {
    let id = parse_id(&id, "category")?;
    let update = CategoryUpdate {
        name: req.name.map(|n| n.trim().to_string()),
        slug: req.slug.as_deref().map(category_slug).transpose()?,
        description: req.description.map(|d| d.trim().to_string()),
    };

    let category = CategoryRepository::new(state.db.pool())
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    Ok(Json(ApiResponse::new(
        "Category updated successfully",
        CategoryResponse::from(category),
    )))
}

/// DELETE /api/categories/:id - Delete an unused category (admin).
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = parse_id(&id, "category")?;
    if !CategoryRepository::new(state.db.pool()).delete(id).await? {
        return Err(ApiError::not_found("Category not found"));
    }
    Ok(Json(ApiResponse::message("Category deleted successfully")))
}
