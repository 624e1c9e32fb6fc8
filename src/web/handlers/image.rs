//! Image upload handler.

use axum::extract::{Multipart, State};
use axum::Json;
use std::sync::Arc;

use crate::media::validate_image;
use crate::web::dto::{ApiResponse, UploadResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::CurrentUser;

/// Multipart field carrying the file.
const IMAGE_FIELD: &str = "image";

/// POST /api/image/upload - Upload an image to the media host.
///
/// Request body: multipart/form-data with an "image" field.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let media = state
        .media
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Image upload is not configured"))?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to read multipart field");
        ApiError::bad_request("Invalid multipart data")
    })? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to read image content");
            ApiError::bad_request("Failed to read image")
        })?;
        upload = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| ApiError::bad_request("No image file provided"))?;
    validate_image(&filename, data.len(), media.max_bytes())?;

    let url = media.upload(&filename, data).await?;
    tracing::info!(user_id = current.user.id, url = %url, "Image uploaded by user");

    Ok(Json(ApiResponse::new(
        "Image uploaded successfully",
        UploadResponse { url },
    )))
}
