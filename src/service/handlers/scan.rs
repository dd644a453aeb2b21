//! Custom sequence scan endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};

use crate::fasta::normalize_sequence_text;
use crate::scan::{scan, PamPattern, ScanParams};
use crate::service::{
    server::AppState,
    types::{ErrorResponse, ScanRequest, ScanResponse, ServiceError},
    validation::{validate_sequence_length, validate_top_k},
};

/// Scan a caller-supplied sequence; no upstream sources are contacted
pub async fn scan_sequence(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResponse>, (StatusCode, Json<ErrorResponse>)> {
    let bad_request = |msg: String| ServiceError::BadRequest(msg).into_rejection();

    let Json(request) =
        payload.map_err(|e| bad_request(format!("Invalid request body: {}", e.body_text())))?;

    let sequence = normalize_sequence_text(&request.sequence).map_err(|e| bad_request(e.to_string()))?;
    validate_sequence_length(sequence.len(), state.config.scan.max_sequence_length)
        .map_err(|e| bad_request(e.to_string()))?;

    let defaults = state.analyzer.scan_params();
    let pam = match request.pam.as_deref() {
        Some(motif) => PamPattern::new(motif).map_err(|e| bad_request(e.to_string()))?,
        None => defaults.pam.clone(),
    };
    let top_k = request.top_k.unwrap_or(defaults.top_k);
    validate_top_k(top_k).map_err(|e| bad_request(e.to_string()))?;
    let params = ScanParams::new(pam, request.guide_length.unwrap_or(defaults.guide_length), top_k)
        .map_err(|e| bad_request(e.to_string()))?;

    let sequence_length = sequence.len();
    let scan_params = params.clone();
    let guides = tokio::task::spawn_blocking(move || scan(&sequence, &scan_params))
        .await
        .map_err(|e| ServiceError::InternalError(format!("scan task failed: {}", e)).into_rejection())?;

    tracing::info!(
        sequence_length,
        pam = %params.pam,
        guides = guides.len(),
        "custom scan complete"
    );

    Ok(Json(ScanResponse {
        sequence_length,
        pam: params.pam.to_string(),
        guide_length: params.guide_length,
        top_grnas: guides,
        custom_analysis: true,
    }))
}
