//! Web server setup using Axum framework

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::explain::GeminiExplainer;
use crate::resolve::SequenceResolver;
use crate::service::{
    config::{parse_size, ServiceConfig},
    handlers,
    types::{ErrorResponse, ServiceError},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Registry, source chain, scan parameters and explainer
    pub analyzer: Arc<Analyzer>,
    /// Service configuration
    pub config: Arc<ServiceConfig>,
    /// Process start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(analyzer: Analyzer, config: ServiceConfig) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            config: Arc::new(config),
            started_at: chrono::Utc::now(),
        }
    }
}

/// Build the analyzer described by a configuration
pub fn build_analyzer(config: &ServiceConfig) -> Result<Analyzer, ServiceError> {
    let registry = config
        .load_registry()
        .map_err(|e| ServiceError::ConfigError(format!("Failed to load registry: {}", e)))?;
    tracing::info!(
        "Registry ready: {} crops, {} traits",
        registry.crop_count(),
        registry.len()
    );

    let params = config
        .scan
        .params()
        .map_err(|e| ServiceError::ConfigError(format!("Invalid scan configuration: {}", e)))?;

    let resolver = SequenceResolver::from_config(&config.sources)
        .map_err(|e| ServiceError::ConfigError(format!("Failed to create sources: {}", e)))?;
    if resolver.is_empty() {
        return Err(ServiceError::ConfigError(
            "At least one sequence source must be enabled".to_string(),
        ));
    }

    let mut analyzer = Analyzer::new(Arc::new(registry), resolver, params);
    match GeminiExplainer::from_config(&config.explanation) {
        Ok(Some(gemini)) => {
            tracing::info!("Explanations enabled via {}", gemini.endpoint());
            analyzer = analyzer.with_explainer(Arc::new(gemini));
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("Explanation generator unavailable: {}", e),
    }
    Ok(analyzer)
}

/// Create the Axum application with all routes and middleware
pub fn create_app(config: ServiceConfig) -> Result<(Router, AppState), ServiceError> {
    let analyzer = build_analyzer(&config)?;
    create_app_with_analyzer(config, analyzer)
}

/// Create the application around an already-built analyzer
pub fn create_app_with_analyzer(
    config: ServiceConfig,
    analyzer: Analyzer,
) -> Result<(Router, AppState), ServiceError> {
    let max_size = parse_size(&config.server.max_request_size)
        .map_err(|e| ServiceError::ConfigError(format!("Invalid max_request_size: {}", e)))?;

    let state = AppState::new(analyzer, config);

    let app = Router::new()
        .route("/api/analyze", post(handlers::analyze::analyze))
        .route("/api/scan", post(handlers::scan::scan_sequence))
        .route(
            "/api/crops_and_traits",
            get(handlers::registry::crops_and_traits),
        )
        .route("/api/health", get(handlers::health::health_check))
        .route("/api/info", get(handlers::info::service_info))
        // Handle 404s
        .fallback(handle_404)
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(max_size));

    Ok((app, state))
}

/// Handle 404 errors
async fn handle_404() -> (StatusCode, Json<ErrorResponse>) {
    ServiceError::NotFound.into_rejection()
}
