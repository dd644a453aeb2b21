//! Service information endpoint

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::service::server::AppState;

/// Provide basic service information
pub async fn service_info(State(state): State<AppState>) -> Json<Value> {
    let params = state.analyzer.scan_params();

    Json(json!({
        "service": "grna-web",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "CRISPR guide RNA design for crop traits",
        "started_at": state.started_at.to_rfc3339(),
        "sources": state.analyzer.resolver().provider_names(),
        "explanations": state.analyzer.has_explainer(),
        "registry": {
            "crops": state.analyzer.registry().crop_count(),
            "traits": state.analyzer.registry().len(),
        },
        "scan": {
            "pam": params.pam.as_str(),
            "guide_length": params.guide_length,
            "top_k": params.top_k,
            "strand": "+",
        },
        "endpoints": {
            "analyze": "POST /api/analyze",
            "scan": "POST /api/scan",
            "registry": "GET /api/crops_and_traits",
            "health": "GET /api/health",
        }
    }))
}
