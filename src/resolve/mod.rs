//! Sequence resolution with ordered provider fallback
//!
//! A [`SequenceResolver`] holds an ordered list of [`SequenceSource`]
//! strategies. Sources are tried strictly in order; the first one that
//! returns a non-empty sequence wins and later sources are never contacted.
//! Every attempt runs under the source's own deadline, and an expired
//! deadline counts as a failure of that source.
//!
//! Identifier-scheme retries (Ensembl stable ID, then gene symbol) happen
//! inside a single source and are not visible here.

pub mod ensembl;
pub mod http_client;
pub mod ncbi;
#[cfg(any(test, feature = "dev"))]
pub mod testing;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::config::{SourceKind, SourcesConfig};
use crate::locus::GeneLocus;

pub use ensembl::EnsemblSource;
pub use ncbi::NcbiSource;

/// Deadline used by sources that do not override [`SequenceSource::deadline`]
pub const DEFAULT_SOURCE_DEADLINE: Duration = Duration::from_secs(30);

/// Why a single source attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("empty sequence")]
    EmptySequence,

    #[error("timed out")]
    Timeout,

    #[error("circuit breaker open")]
    CircuitOpen,
}

/// Position of the winning source in the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceTag {
    Primary,
    Secondary,
    /// Third or later source (0-based rank)
    Fallback(usize),
}

impl SourceTag {
    pub fn from_rank(rank: usize) -> Self {
        match rank {
            0 => SourceTag::Primary,
            1 => SourceTag::Secondary,
            n => SourceTag::Fallback(n),
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            SourceTag::Primary => 0,
            SourceTag::Secondary => 1,
            SourceTag::Fallback(n) => *n,
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTag::Primary => write!(f, "Primary"),
            SourceTag::Secondary => write!(f, "Secondary"),
            SourceTag::Fallback(n) => write!(f, "Fallback{}", n + 1),
        }
    }
}

impl Serialize for SourceTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A sequence obtained from one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSequence {
    /// Bare nucleotide letters, whitespace removed
    pub raw: String,
    pub source: SourceTag,
    /// Name of the provider that answered (e.g. "ensembl")
    pub provider: &'static str,
}

impl ResolvedSequence {
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// One failed attempt, kept for logging and error details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAttempt {
    pub provider: &'static str,
    pub error: SourceError,
    pub elapsed: Duration,
}

impl fmt::Display for SourceAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} after {}ms",
            self.provider,
            self.error,
            self.elapsed.as_millis()
        )
    }
}

/// Every configured source failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to retrieve gene sequence from {}", describe_attempts(.attempts))]
pub struct ResolutionFailure {
    pub attempts: Vec<SourceAttempt>,
}

fn describe_attempts(attempts: &[SourceAttempt]) -> String {
    if attempts.is_empty() {
        return "any source (none configured)".to_string();
    }
    attempts
        .iter()
        .map(|a| a.provider)
        .collect::<Vec<_>>()
        .join(" or ")
}

/// A strategy that can fetch the genomic sequence of a registry locus
#[async_trait]
pub trait SequenceSource: Send + Sync {
    /// Provider name used in logs and responses
    fn name(&self) -> &'static str;

    /// Upper bound on one complete attempt, including internal retries
    fn deadline(&self) -> Duration {
        DEFAULT_SOURCE_DEADLINE
    }

    /// Fetch the sequence for a locus
    async fn fetch_sequence(&self, locus: &GeneLocus) -> Result<String, SourceError>;

    /// Cheap reachability probe
    async fn health_check(&self) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Strip whitespace and reject empty or non-alphabetic payloads
pub fn clean_sequence(raw: &str) -> Result<String, SourceError> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(SourceError::EmptySequence);
    }
    if let Some(c) = cleaned.chars().find(|c| !c.is_ascii_alphabetic()) {
        return Err(SourceError::Malformed(format!(
            "unexpected character '{}' in sequence",
            c
        )));
    }
    Ok(cleaned)
}

/// Ordered chain of sequence sources
#[derive(Clone, Default)]
pub struct SequenceResolver {
    sources: Vec<Arc<dyn SequenceSource>>,
}

impl fmt::Debug for SequenceResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceResolver")
            .field("sources", &self.provider_names())
            .finish()
    }
}

impl SequenceResolver {
    /// Build a resolver; the first source is the primary
    pub fn new(sources: Vec<Arc<dyn SequenceSource>>) -> Self {
        Self { sources }
    }

    /// Build the configured Ensembl/NCBI chain, skipping disabled sources
    pub fn from_config(config: &SourcesConfig) -> Result<Self, SourceError> {
        let mut sources: Vec<Arc<dyn SequenceSource>> = Vec::new();
        for kind in config.enabled_sources() {
            match kind {
                SourceKind::Ensembl => {
                    if let Some(ensembl) = &config.ensembl {
                        sources.push(Arc::new(EnsemblSource::new(ensembl)?));
                    }
                }
                SourceKind::Ncbi => {
                    if let Some(ncbi) = &config.ncbi {
                        sources.push(Arc::new(NcbiSource::new(ncbi)?));
                    }
                }
            }
        }
        let resolver = Self::new(sources);
        tracing::info!(sources = ?resolver.provider_names(), "sequence resolver ready");
        Ok(resolver)
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn sources(&self) -> &[Arc<dyn SequenceSource>] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Try each source in order and return the first usable sequence
    pub async fn resolve(&self, locus: &GeneLocus) -> Result<ResolvedSequence, ResolutionFailure> {
        let mut attempts = Vec::with_capacity(self.sources.len());

        for (rank, source) in self.sources.iter().enumerate() {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(source.deadline(), source.fetch_sequence(locus))
                .await
            {
                Ok(result) => result.and_then(|raw| clean_sequence(&raw)),
                Err(_) => Err(SourceError::Timeout),
            };

            match outcome {
                Ok(raw) => {
                    let resolved = ResolvedSequence {
                        raw,
                        source: SourceTag::from_rank(rank),
                        provider: source.name(),
                    };
                    tracing::info!(
                        crop = %locus.crop,
                        gene = %locus.external_id,
                        provider = resolved.provider,
                        source = %resolved.source,
                        length = resolved.len(),
                        "resolved gene sequence"
                    );
                    return Ok(resolved);
                }
                Err(error) => {
                    let attempt = SourceAttempt {
                        provider: source.name(),
                        error,
                        elapsed: started.elapsed(),
                    };
                    tracing::warn!(
                        crop = %locus.crop,
                        gene = %locus.external_id,
                        symbol = %locus.symbol,
                        "sequence source failed: {}",
                        attempt
                    );
                    attempts.push(attempt);
                }
            }
        }

        Err(ResolutionFailure { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_tag_from_rank() {
        assert_eq!(SourceTag::from_rank(0), SourceTag::Primary);
        assert_eq!(SourceTag::from_rank(1), SourceTag::Secondary);
        assert_eq!(SourceTag::from_rank(2), SourceTag::Fallback(2));
        assert_eq!(SourceTag::from_rank(2).rank(), 2);
    }

    #[test]
    fn test_source_tag_serializes_as_string() {
        assert_eq!(serde_json::to_value(SourceTag::Primary).unwrap(), "Primary");
        assert_eq!(
            serde_json::to_value(SourceTag::Secondary).unwrap(),
            "Secondary"
        );
        assert_eq!(SourceTag::Fallback(2).to_string(), "Fallback3");
    }

    #[test]
    fn test_clean_sequence() {
        assert_eq!(clean_sequence("AC GT\nNN").unwrap(), "ACGTNN");
        assert_eq!(clean_sequence(" \n "), Err(SourceError::EmptySequence));
        assert!(matches!(
            clean_sequence("ACGT-"),
            Err(SourceError::Malformed(_))
        ));
    }

    #[test]
    fn test_resolution_failure_message() {
        let failure = ResolutionFailure {
            attempts: vec![
                SourceAttempt {
                    provider: "ensembl",
                    error: SourceError::Timeout,
                    elapsed: Duration::from_millis(5),
                },
                SourceAttempt {
                    provider: "ncbi",
                    error: SourceError::NotFound("no records".to_string()),
                    elapsed: Duration::from_millis(7),
                },
            ],
        };
        assert_eq!(
            failure.to_string(),
            "Failed to retrieve gene sequence from ensembl or ncbi"
        );
        assert_eq!(failure.attempts[0].to_string(), "ensembl: timed out after 5ms");
    }

    fn locus() -> GeneLocus {
        GeneLocus {
            crop: "rice".to_string(),
            trait_name: "drought resistance".to_string(),
            organism_id: "oryza_sativa".to_string(),
            external_id: "LOC_Os06g03670".to_string(),
            symbol: "DREB1A".to_string(),
        }
    }

    #[tokio::test]
    async fn test_secondary_used_after_primary_failure() {
        let primary = Arc::new(testing::StaticSource::failing(
            "ensembl",
            SourceError::NotFound("unknown id".to_string()),
        ));
        let secondary = Arc::new(testing::StaticSource::ok("ncbi", "acgt\nACGT"));
        let resolver = SequenceResolver::new(vec![
            primary.clone() as Arc<dyn SequenceSource>,
            secondary.clone(),
        ]);

        let resolved = resolver.resolve(&locus()).await.unwrap();
        assert_eq!(resolved.source, SourceTag::Secondary);
        assert_eq!(resolved.provider, "ncbi");
        assert_eq!(resolved.raw, "acgtACGT");
        assert_eq!((primary.calls(), secondary.calls()), (1, 1));
    }

    #[tokio::test]
    async fn test_stalled_source_times_out() {
        let primary = Arc::new(
            testing::StaticSource::ok("ensembl", "ACGT")
                .with_delay(Duration::from_secs(5))
                .with_deadline(Duration::from_millis(20)),
        );
        let failure = SequenceResolver::new(vec![primary])
            .resolve(&locus())
            .await
            .unwrap_err();
        assert_eq!(failure.attempts.len(), 1);
        assert_eq!(failure.attempts[0].error, SourceError::Timeout);
    }

    #[tokio::test]
    async fn test_empty_resolver_fails() {
        let failure = SequenceResolver::default().resolve(&locus()).await.unwrap_err();
        assert!(failure.attempts.is_empty());
    }
}
