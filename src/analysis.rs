//! Crop/trait analysis: registry lookup, sequence resolution, guide scan, explanation
//!
//! [`Analyzer`] owns the immutable registry, the ordered source chain and the
//! scan parameters. A lookup miss fails before any network call; a resolution
//! failure fails before scanning; an explanation failure only replaces the
//! explanation text.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::explain::{explain_or_placeholder, ExplanationGenerator, ExplanationRequest};
use crate::locus::{GeneLocus, LocusRegistry, LookupError};
use crate::resolve::{ResolutionFailure, ResolvedSequence, SequenceResolver, SourceTag};
use crate::scan::{scan, GuideCandidate, ScanParams};

/// Terminal failures of one analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Unsupported(#[from] LookupError),

    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Outcome of a successful analysis
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub locus: GeneLocus,
    pub source: SourceTag,
    pub provider: &'static str,
    pub sequence_length: usize,
    pub guides: Vec<GuideCandidate>,
    pub explanation: String,
    /// False when `explanation` is a placeholder
    pub explanation_generated: bool,
}

/// Request orchestration
#[derive(Clone)]
pub struct Analyzer {
    registry: Arc<LocusRegistry>,
    resolver: SequenceResolver,
    params: ScanParams,
    explainer: Option<Arc<dyn ExplanationGenerator>>,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("crops", &self.registry.crop_count())
            .field("resolver", &self.resolver)
            .field("params", &self.params)
            .field("explainer", &self.explainer.as_ref().map(|e| e.name()))
            .finish()
    }
}

impl Analyzer {
    pub fn new(registry: Arc<LocusRegistry>, resolver: SequenceResolver, params: ScanParams) -> Self {
        Self {
            registry,
            resolver,
            params,
            explainer: None,
        }
    }

    /// Attach an explanation generator
    pub fn with_explainer(mut self, explainer: Arc<dyn ExplanationGenerator>) -> Self {
        self.explainer = Some(explainer);
        self
    }

    pub fn registry(&self) -> &LocusRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &SequenceResolver {
        &self.resolver
    }

    pub fn scan_params(&self) -> &ScanParams {
        &self.params
    }

    pub fn has_explainer(&self) -> bool {
        self.explainer.is_some()
    }

    /// Design guides for the gene registered for (crop, trait)
    pub async fn analyze(&self, crop: &str, trait_name: &str) -> Result<AnalysisReport, AnalysisError> {
        let locus = self.registry.lookup(crop, trait_name)?;
        tracing::info!(
            crop = %locus.crop,
            trait_name = %locus.trait_name,
            gene = %locus.external_id,
            symbol = %locus.symbol,
            "analyzing locus"
        );

        let resolved = self.resolver.resolve(&locus).await?;
        let (source, provider) = (resolved.source, resolved.provider);
        let sequence_length = resolved.len();
        let guides = self.scan_resolved(resolved).await?;

        let request = ExplanationRequest {
            crop: locus.crop.clone(),
            trait_name: locus.trait_name.clone(),
            gene: locus.gene_ref(),
            sequence_length: Some(sequence_length),
        };
        let (explanation, explanation_generated) =
            explain_or_placeholder(self.explainer.as_deref(), &request).await;

        Ok(AnalysisReport {
            locus,
            source,
            provider,
            sequence_length,
            guides,
            explanation,
            explanation_generated,
        })
    }

    /// Scan off the async executor; gene regions can be megabases long
    async fn scan_resolved(&self, resolved: ResolvedSequence) -> Result<Vec<GuideCandidate>, AnalysisError> {
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || scan(&resolved.raw, &params))
            .await
            .map_err(|e| AnalysisError::Internal(format!("scan task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::testing::StaticSource;

    fn analyzer(source: Arc<StaticSource>) -> Analyzer {
        Analyzer::new(
            Arc::new(LocusRegistry::embedded().unwrap()),
            SequenceResolver::new(vec![source as Arc<dyn crate::resolve::SequenceSource>]),
            ScanParams::default(),
        )
    }

    #[tokio::test]
    async fn test_unsupported_pair_makes_no_source_calls() {
        let source = Arc::new(StaticSource::ok("canned", "ACGT"));
        let analyzer = analyzer(source.clone());

        let err = analyzer.analyze("kryptonite", "anything").await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Unsupported(LookupError::UnsupportedCrop { .. })
        ));
        let err = analyzer.analyze("rice", "flight").await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Unsupported(LookupError::UnsupportedTrait { .. })
        ));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_analysis_without_explainer_uses_placeholder() {
        let source = Arc::new(StaticSource::ok("canned", "TTTTTTTTTTTTTTTTTTTTTGG"));
        let report = analyzer(source).analyze("Rice", "Drought Resistance").await.unwrap();
        assert_eq!(report.source, SourceTag::Primary);
        assert_eq!(report.sequence_length, 23);
        assert_eq!(report.guides.len(), 1);
        assert_eq!(report.guides[0].start_offset, 0);
        assert!(!report.explanation_generated);
        assert!(report.explanation.starts_with("Explanation unavailable"));
    }

    #[tokio::test]
    async fn test_report_names_the_answering_source() {
        let primary = Arc::new(StaticSource::failing(
            "ensembl",
            crate::resolve::SourceError::NotFound("no gene".to_string()),
        ));
        let secondary = Arc::new(StaticSource::ok("ncbi", "acgtTTTTTTTTTTTTTTTTTTTTAGG"));
        let analyzer = Analyzer::new(
            Arc::new(LocusRegistry::embedded().unwrap()),
            SequenceResolver::new(vec![
                primary as Arc<dyn crate::resolve::SequenceSource>,
                secondary.clone() as Arc<dyn crate::resolve::SequenceSource>,
            ]),
            ScanParams::default(),
        );

        let report = analyzer.analyze("rice", "drought resistance").await.unwrap();
        assert_eq!(report.source, SourceTag::Secondary);
        assert_eq!(report.provider, "ncbi");
        assert_eq!(report.sequence_length, 27);
        assert_eq!(report.guides.len(), 1);
        assert_eq!(report.guides[0].start_offset, 4);
        assert_eq!(secondary.calls(), 1);
    }
}
