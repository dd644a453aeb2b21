//! Crop/trait analysis endpoint

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};

use crate::service::{
    server::AppState,
    types::{AnalyzeRequest, AnalyzeResponse, ErrorResponse, ServiceError},
    validation::validate_selection,
};

/// Design guides for the gene registered for a crop/trait pair
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(request) = payload.map_err(|e| {
        ServiceError::BadRequest(format!("Invalid request body: {}", e.body_text())).into_rejection()
    })?;

    for (field, value) in [("crop", &request.crop), ("trait", &request.trait_name)] {
        if let Err(validation_error) = validate_selection(field, value) {
            return Err(ServiceError::BadRequest(validation_error.to_string()).into_rejection());
        }
    }

    let started = Instant::now();
    match state
        .analyzer
        .analyze(&request.crop, &request.trait_name)
        .await
    {
        Ok(report) => {
            tracing::info!(
                crop = %report.locus.crop,
                trait_name = %report.locus.trait_name,
                provider = report.provider,
                guides = report.guides.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "analysis complete"
            );
            Ok(Json(AnalyzeResponse::from(report)))
        }
        Err(e) => {
            tracing::info!(
                crop = %request.crop,
                trait_name = %request.trait_name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "analysis failed: {}",
                e
            );
            Err(ServiceError::from(e).into_rejection())
        }
    }
}
