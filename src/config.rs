//! Configuration for scanning, upstream sequence sources and explanation
//!
//! These sections are shared by the web service configuration file and the
//! library API. Every section has working defaults, so a configuration file
//! only needs to list what it overrides.
//!
//! # Example Configuration
//!
//! ```toml
//! [scan]
//! pam = "NGG"
//! guide_length = 20
//! top_k = 3
//!
//! [sources]
//! order = ["ensembl", "ncbi"]
//!
//! [sources.ncbi]
//! enabled = true
//! email = "lab@example.org"
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::GrnaError;
use crate::scan::{PamPattern, ScanParams, DEFAULT_GUIDE_LENGTH, DEFAULT_TOP_K};

/// Guide scanning parameters for crop/trait analysis
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// PAM motif over {A,C,G,T,N} (default: "NGG")
    pub pam: String,
    /// Guide length in bases (default: 20)
    pub guide_length: usize,
    /// Number of ranked guides returned (default: 3)
    pub top_k: usize,
    /// Largest sequence accepted by the custom scan endpoint (default: 5 Mb)
    pub max_sequence_length: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pam: "NGG".to_string(),
            guide_length: DEFAULT_GUIDE_LENGTH,
            top_k: DEFAULT_TOP_K,
            max_sequence_length: 5_000_000,
        }
    }
}

impl ScanConfig {
    /// Compile into validated scan parameters
    pub fn params(&self) -> Result<ScanParams, GrnaError> {
        let pam = PamPattern::new(&self.pam)?;
        if self.top_k == 0 {
            return Err(GrnaError::InvalidTopK {
                top_k: self.top_k,
                reason: "at least one guide must be returned".to_string(),
            });
        }
        ScanParams::new(pam, self.guide_length, self.top_k)
    }
}

/// Upstream sequence providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Ensembl REST (identifier lookup + region sequence)
    Ensembl,
    /// NCBI E-utilities (esearch + efetch FASTA)
    Ncbi,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Ensembl => "ensembl",
            SourceKind::Ncbi => "ncbi",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered source chain and per-source settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Fallback order; the first entry is the primary source
    pub order: Vec<SourceKind>,
    pub ensembl: Option<EnsemblConfig>,
    pub ncbi: Option<NcbiConfig>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            order: vec![SourceKind::Ensembl, SourceKind::Ncbi],
            ensembl: Some(EnsemblConfig::default()),
            ncbi: Some(NcbiConfig::default()),
        }
    }
}

impl SourcesConfig {
    /// Enabled sources in fallback order
    pub fn enabled_sources(&self) -> Vec<SourceKind> {
        self.order
            .iter()
            .copied()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }

    /// Check if a source is configured and enabled
    pub fn is_enabled(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Ensembl => self.ensembl.as_ref().is_some_and(|c| c.enabled),
            SourceKind::Ncbi => self.ncbi.as_ref().is_some_and(|c| c.enabled),
        }
    }
}

/// Ensembl REST configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnsemblConfig {
    /// Whether source is enabled
    pub enabled: bool,
    /// REST base URL (default: "https://rest.ensembl.org")
    pub base_url: String,
    /// Per-call timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Minimum delay between requests in milliseconds (default: 67, ~15 req/s)
    pub rate_limit_ms: Option<u64>,
    /// Circuit breaker configuration
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl Default for EnsemblConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://rest.ensembl.org".to_string(),
            timeout_seconds: 30,
            rate_limit_ms: Some(67),
            circuit_breaker: Some(CircuitBreakerConfig::default()),
        }
    }
}

/// NCBI E-utilities configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NcbiConfig {
    /// Whether source is enabled
    pub enabled: bool,
    /// E-utilities base URL
    pub base_url: String,
    /// Entrez database searched (default: "nucleotide")
    pub database: String,
    /// Tool name reported to NCBI
    pub tool: String,
    /// Contact email reported to NCBI
    pub email: Option<String>,
    /// Optional API key (raises the NCBI rate limit)
    pub api_key: Option<String>,
    /// Per-call timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Minimum delay between requests in milliseconds (default: 334, ~3 req/s)
    pub rate_limit_ms: Option<u64>,
    /// Circuit breaker configuration
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl Default for NcbiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            database: "nucleotide".to_string(),
            tool: env!("CARGO_PKG_NAME").to_string(),
            email: None,
            api_key: None,
            timeout_seconds: 30,
            rate_limit_ms: Some(334),
            circuit_breaker: Some(CircuitBreakerConfig::default()),
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CircuitBreakerConfig {
    /// Failure threshold before opening circuit (default: 5)
    pub failure_threshold: Option<u32>,
    /// Recovery timeout in seconds (default: 60)
    pub recovery_timeout_seconds: Option<u64>,
    /// Success threshold for closing circuit (default: 3)
    pub success_threshold: Option<u32>,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: Some(5),
            recovery_timeout_seconds: Some(60),
            success_threshold: Some(3),
        }
    }
}

/// Explanation generator configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExplanationConfig {
    /// Whether explanations are requested at all
    pub enabled: bool,
    /// Generative Language API base URL
    pub api_url: String,
    /// Model name
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Per-call timeout in seconds (default: 60)
    pub timeout_seconds: u64,
}

impl Default for ExplanationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Data artifact locations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DataConfig {
    /// Replacement crop/trait registry (JSON); the embedded table is used when unset
    pub registry_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scan_params() {
        let params = ScanConfig::default().params().unwrap();
        assert_eq!(params.pam.as_str(), "NGG");
        assert_eq!(params.guide_length, 20);
        assert_eq!(params.top_k, 3);
    }

    #[test]
    fn test_invalid_scan_config() {
        let bad_pam = ScanConfig {
            pam: "NQG".to_string(),
            ..ScanConfig::default()
        };
        assert!(bad_pam.params().is_err());

        let zero_top_k = ScanConfig {
            top_k: 0,
            ..ScanConfig::default()
        };
        assert!(zero_top_k.params().is_err());
    }

    #[test]
    fn test_enabled_sources_follow_order() {
        let mut sources = SourcesConfig::default();
        assert_eq!(
            sources.enabled_sources(),
            vec![SourceKind::Ensembl, SourceKind::Ncbi]
        );

        sources.order = vec![SourceKind::Ncbi, SourceKind::Ensembl];
        assert_eq!(
            sources.enabled_sources(),
            vec![SourceKind::Ncbi, SourceKind::Ensembl]
        );

        sources.ensembl = Some(EnsemblConfig {
            enabled: false,
            ..EnsemblConfig::default()
        });
        assert_eq!(sources.enabled_sources(), vec![SourceKind::Ncbi]);

        sources.ncbi = None;
        assert!(sources.enabled_sources().is_empty());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let sources: SourcesConfig = toml::from_str(
            r#"
            order = ["ncbi"]
            [ncbi]
            email = "lab@example.org"
            "#,
        )
        .unwrap();
        assert_eq!(sources.order, vec![SourceKind::Ncbi]);
        let ncbi = sources.ncbi.unwrap();
        assert!(ncbi.enabled);
        assert_eq!(ncbi.email.as_deref(), Some("lab@example.org"));
        assert_eq!(ncbi.database, "nucleotide");
    }
}
