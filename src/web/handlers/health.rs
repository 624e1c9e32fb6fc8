//! Liveness probe.

use axum::Json;

use crate::web::dto::{ApiResponse, HealthResponse};

/// GET /api/health
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::new(
        "Blog API is running",
        HealthResponse { status: "OK" },
    ))
}
