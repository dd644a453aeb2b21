//! Ordered source fallback in the sequence resolver

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agro_grna::resolve::{SequenceResolver, SequenceSource, SourceError, SourceTag};
use agro_grna::GeneLocus;
use async_trait::async_trait;
use rstest::rstest;

/// Scripted source: `Some(seq)` answers, `None` stalls past its deadline
struct Scripted {
    name: &'static str,
    reply: Option<Result<&'static str, SourceError>>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(name: &'static str, reply: Option<Result<&'static str, SourceError>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SequenceSource for Scripted {
    fn name(&self) -> &'static str {
        self.name
    }

    fn deadline(&self) -> Duration {
        Duration::from_millis(50)
    }

    async fn fetch_sequence(&self, _locus: &GeneLocus) -> Result<String, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(reply) => reply.clone().map(str::to_string),
            None => {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok("ACGT".to_string())
            }
        }
    }
}

fn locus() -> GeneLocus {
    GeneLocus {
        crop: "maize".to_string(),
        trait_name: "drought tolerance".to_string(),
        organism_id: "zea_mays".to_string(),
        external_id: "Zm00001d002222".to_string(),
        symbol: "ZmDREB2A".to_string(),
    }
}

fn resolver(sources: &[Arc<Scripted>]) -> SequenceResolver {
    SequenceResolver::new(
        sources
            .iter()
            .map(|s| s.clone() as Arc<dyn SequenceSource>)
            .collect(),
    )
}

#[tokio::test]
async fn test_primary_success_never_contacts_secondary() {
    let primary = Scripted::new("ensembl", Some(Ok("ACGTACGT")));
    let secondary = Scripted::new("ncbi", Some(Ok("TTTT")));

    let resolved = resolver(&[primary.clone(), secondary.clone()])
        .resolve(&locus())
        .await
        .unwrap();

    assert_eq!(resolved.source, SourceTag::Primary);
    assert_eq!(resolved.raw, "ACGTACGT");
    assert_eq!(resolved.len(), 8);
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 0);
}

#[rstest]
#[case::not_found(Some(Err(SourceError::NotFound("no gene".to_string()))))]
#[case::server_error(Some(Err(SourceError::HttpStatus { status: 503, url: "http://x".to_string() })))]
#[case::empty(Some(Ok("")))]
#[case::whitespace_only(Some(Ok(" \n\t")))]
#[case::malformed(Some(Ok("ACGT<html>")))]
#[case::circuit_open(Some(Err(SourceError::CircuitOpen)))]
#[case::stalled(None)]
#[tokio::test]
async fn test_primary_failure_falls_back(#[case] reply: Option<Result<&'static str, SourceError>>) {
    let primary = Scripted::new("ensembl", reply);
    let secondary = Scripted::new("ncbi", Some(Ok("GGGCCC")));

    let resolved = resolver(&[primary.clone(), secondary.clone()])
        .resolve(&locus())
        .await
        .unwrap();

    assert_eq!(resolved.source, SourceTag::Secondary);
    assert_eq!(resolved.provider, "ncbi");
    assert_eq!(resolved.raw, "GGGCCC");
    assert_eq!((primary.calls(), secondary.calls()), (1, 1));
}

#[tokio::test]
async fn test_both_sources_fail_reports_each_attempt() {
    let primary = Scripted::new("ensembl", None);
    let secondary = Scripted::new("ncbi", Some(Err(SourceError::NotFound("none".to_string()))));

    let failure = resolver(&[primary, secondary])
        .resolve(&locus())
        .await
        .unwrap_err();

    let summary: Vec<(&str, SourceError)> = failure
        .attempts
        .iter()
        .map(|a| (a.provider, a.error.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("ensembl", SourceError::Timeout),
            ("ncbi", SourceError::NotFound("none".to_string())),
        ]
    );
    assert_eq!(
        failure.to_string(),
        "Failed to retrieve gene sequence from ensembl or ncbi"
    );
}

#[tokio::test]
async fn test_later_sources_are_tagged_by_rank() {
    let failing = |name| Scripted::new(name, Some(Err(SourceError::EmptySequence)));
    let third = Scripted::new("mirror", Some(Ok("ACGT")));

    let resolved = resolver(&[failing("ensembl"), failing("ncbi"), third])
        .resolve(&locus())
        .await
        .unwrap();

    assert_eq!(resolved.source, SourceTag::Fallback(2));
    assert_eq!(resolved.source.to_string(), "Fallback3");
}

#[tokio::test]
async fn test_resolver_is_reusable_across_requests() {
    let primary = Scripted::new("ensembl", Some(Ok("ACGT")));
    let resolver = resolver(&[primary.clone()]);

    for _ in 0..3 {
        resolver.resolve(&locus()).await.unwrap();
    }
    assert_eq!(primary.calls(), 3);
    assert_eq!(resolver.provider_names(), vec!["ensembl"]);
}
