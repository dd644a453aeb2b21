//! Request and response types for the gRNA design web service

use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisError, AnalysisReport};
use crate::locus::{GeneRef, LookupError};
use crate::resolve::ResolutionFailure;
use crate::scan::GuideCandidate;

/// Crop/trait analysis request
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalyzeRequest {
    /// Crop name (case-insensitive)
    #[serde(default)]
    pub crop: String,
    /// Trait name (case-insensitive)
    #[serde(default, rename = "trait")]
    pub trait_name: String,
}

/// Crop/trait analysis response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub crop: String,
    #[serde(rename = "trait")]
    pub trait_name: String,
    pub gene: GeneRef,
    /// Position of the answering source in the fallback chain
    pub source: String,
    /// Provider that supplied the sequence
    pub provider: String,
    pub sequence_length: usize,
    pub top_grnas: Vec<GuideCandidate>,
    pub explanation: String,
    /// Always false: the sequence came from the registry, not the caller
    pub custom_analysis: bool,
}

impl From<AnalysisReport> for AnalyzeResponse {
    fn from(report: AnalysisReport) -> Self {
        Self {
            gene: report.locus.gene_ref(),
            crop: report.locus.crop,
            trait_name: report.locus.trait_name,
            source: report.source.to_string(),
            provider: report.provider.to_string(),
            sequence_length: report.sequence_length,
            top_grnas: report.guides,
            explanation: report.explanation,
            custom_analysis: false,
        }
    }
}

/// Caller-supplied sequence scan request
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScanRequest {
    /// Raw sequence or FASTA text (first record used)
    pub sequence: String,
    /// PAM motif (default: configured PAM)
    pub pam: Option<String>,
    /// Guide length (default: configured length)
    pub guide_length: Option<usize>,
    /// Number of guides returned (default: configured top_k)
    pub top_k: Option<usize>,
}

/// Caller-supplied sequence scan response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    pub sequence_length: usize,
    pub pam: String,
    pub guide_length: usize,
    pub top_grnas: Vec<GuideCandidate>,
    pub custom_analysis: bool,
}

/// Liveness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            message: "API running".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Standard error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Optional additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Service error types
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Unsupported(#[from] LookupError),

    #[error("Failed to retrieve gene sequence from any configured source")]
    ResolutionFailed(ResolutionFailure),

    #[error("Endpoint not found")]
    NotFound,

    #[error("Internal server error")]
    InternalError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<AnalysisError> for ServiceError {
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::Unsupported(e) => ServiceError::Unsupported(e),
            AnalysisError::Resolution(e) => ServiceError::ResolutionFailed(e),
            AnalysisError::Internal(msg) => ServiceError::InternalError(msg),
        }
    }
}

impl ServiceError {
    /// Convert to HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::Unsupported(_) => 400,
            ServiceError::NotFound => 404,
            ServiceError::ResolutionFailed(_) => 500,
            ServiceError::InternalError(_) => 500,
            ServiceError::ConfigError(_) => 500,
        }
    }

    /// Convert to error response
    ///
    /// Upstream and internal failure details are logged, not returned.
    pub fn to_response(&self) -> ErrorResponse {
        let details = match self {
            ServiceError::ResolutionFailed(failure) => Some(serde_json::json!({
                "attempted": failure.attempts.iter().map(|a| a.provider).collect::<Vec<_>>(),
            })),
            _ => None,
        };
        ErrorResponse {
            error: self.to_string(),
            details,
        }
    }

    /// Status and body pair returned by handlers
    pub fn into_rejection(self) -> (StatusCode, Json<ErrorResponse>) {
        match &self {
            ServiceError::InternalError(msg) => tracing::error!("Internal error: {}", msg),
            ServiceError::ConfigError(msg) => tracing::error!("Configuration error: {}", msg),
            _ => {}
        }
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{SourceAttempt, SourceError};
    use std::time::Duration;

    #[test]
    fn test_analyze_request_accepts_missing_fields() {
        let request: AnalyzeRequest = serde_json::from_str(r#"{"crop": "rice"}"#).unwrap();
        assert_eq!(request.crop, "rice");
        assert_eq!(request.trait_name, "");

        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"crop": "Rice", "trait": "Drought Resistance"}"#).unwrap();
        assert_eq!(request.trait_name, "Drought Resistance");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(
            ServiceError::Unsupported(LookupError::UnsupportedCrop {
                crop: "mars".into()
            })
            .status_code(),
            400
        );
        assert_eq!(ServiceError::NotFound.status_code(), 404);
        assert_eq!(
            ServiceError::ResolutionFailed(ResolutionFailure { attempts: vec![] }).status_code(),
            500
        );
        assert_eq!(ServiceError::InternalError("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_analysis_errors_map_to_statuses() {
        let unsupported = AnalysisError::Unsupported(LookupError::UnsupportedTrait {
            crop: "rice".into(),
            trait_name: "flight".into(),
        });
        let resolution = AnalysisError::Resolution(ResolutionFailure { attempts: vec![] });
        let internal = AnalysisError::Internal("scan task failed".into());

        assert_eq!(ServiceError::from(unsupported).status_code(), 400);
        assert_eq!(ServiceError::from(resolution).status_code(), 500);
        assert!(matches!(
            ServiceError::from(internal),
            ServiceError::InternalError(msg) if msg == "scan task failed"
        ));
    }

    #[test]
    fn test_internal_error_hides_details() {
        let body = serde_json::to_value(
            ServiceError::InternalError("stack overflow in thread 7".into()).to_response(),
        )
        .unwrap();
        assert_eq!(body, serde_json::json!({"error": "Internal server error"}));
    }

    #[test]
    fn test_resolution_failure_lists_providers_only() {
        let failure = ResolutionFailure {
            attempts: vec![
                SourceAttempt {
                    provider: "ensembl",
                    error: SourceError::Transport("dns failure for internal host".into()),
                    elapsed: Duration::from_millis(3),
                },
                SourceAttempt {
                    provider: "ncbi",
                    error: SourceError::Timeout,
                    elapsed: Duration::from_millis(30),
                },
            ],
        };
        let body = serde_json::to_value(ServiceError::ResolutionFailed(failure).to_response())
            .unwrap();
        assert_eq!(
            body["error"],
            "Failed to retrieve gene sequence from any configured source"
        );
        assert_eq!(body["details"]["attempted"], serde_json::json!(["ensembl", "ncbi"]));
        assert!(!body.to_string().contains("dns"));
    }
}
