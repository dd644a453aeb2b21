//! Registry introspection endpoint

use axum::{extract::State, response::Json};

use crate::locus::LocusRegistry;
use crate::service::server::AppState;

/// Return the full crop/trait registry
pub async fn crops_and_traits(State(state): State<AppState>) -> Json<LocusRegistry> {
    Json(state.analyzer.registry().clone())
}
