//! Health check endpoint

use axum::response::Json;

use crate::service::types::HealthResponse;

/// Liveness probe; never touches upstream sources
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}
