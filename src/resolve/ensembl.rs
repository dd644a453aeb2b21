//! Ensembl REST sequence source
//!
//! Resolution is a two-step protocol:
//!
//! 1. `GET /lookup/id/{external_id}` for the gene's region; when the stable
//!    identifier is not recognized (any non-success status), retry once with
//!    `GET /lookup/symbol/{species}/{symbol}`.
//! 2. `GET /sequence/region/{species}/{region}:{start}-{end}` for the bases.
//!
//! A transport error or timeout on the identifier lookup fails the source
//! immediately without the symbol retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Deserialize;

use crate::config::EnsemblConfig;
use crate::locus::GeneLocus;
use crate::resolve::http_client::UpstreamClient;
use crate::resolve::{SequenceSource, SourceError};

/// Lookup endpoint payload; only the region fields are read
#[derive(Debug, Clone, Deserialize)]
struct LookupResponse {
    #[serde(alias = "sequence_region_name")]
    seq_region_name: String,
    start: u64,
    end: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct SequenceResponse {
    seq: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PingResponse {
    ping: u8,
}

/// Genomic interval returned by a lookup (1-based, inclusive)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRegion {
    pub seq_region_name: String,
    pub start: u64,
    pub end: u64,
}

impl GeneRegion {
    /// `chrom:start-end` form used by the sequence endpoint
    pub fn to_region_string(&self) -> String {
        format!("{}:{}-{}", self.seq_region_name, self.start, self.end)
    }

    /// Number of bases covered
    pub fn span(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Parse a lookup body into a validated region
pub fn parse_lookup(body: &str) -> Result<GeneRegion, SourceError> {
    let lookup: LookupResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::Malformed(format!("lookup response: {}", e)))?;
    if lookup.seq_region_name.is_empty() || lookup.start == 0 || lookup.end < lookup.start {
        return Err(SourceError::Malformed(format!(
            "invalid region {}:{}-{}",
            lookup.seq_region_name, lookup.start, lookup.end
        )));
    }
    Ok(GeneRegion {
        seq_region_name: lookup.seq_region_name,
        start: lookup.start,
        end: lookup.end,
    })
}

/// Parse a region sequence body
pub fn parse_sequence(body: &str) -> Result<String, SourceError> {
    let response: SequenceResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::Malformed(format!("sequence response: {}", e)))?;
    Ok(response.seq)
}

pub fn lookup_id_url(base_url: &str, external_id: &str) -> String {
    format!(
        "{}/lookup/id/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(external_id)
    )
}

pub fn lookup_symbol_url(base_url: &str, species: &str, symbol: &str) -> String {
    format!(
        "{}/lookup/symbol/{}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(species),
        urlencoding::encode(symbol)
    )
}

pub fn region_url(base_url: &str, species: &str, region: &GeneRegion) -> String {
    format!(
        "{}/sequence/region/{}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(species),
        region.to_region_string()
    )
}

/// Ensembl REST source
#[derive(Debug)]
pub struct EnsemblSource {
    client: UpstreamClient,
    base_url: String,
    deadline: Duration,
}

impl EnsemblSource {
    pub fn new(config: &EnsemblConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let timeout = Duration::from_secs(config.timeout_seconds.max(1));
        let client = UpstreamClient::new(
            "ensembl",
            timeout,
            config.rate_limit_ms,
            config.circuit_breaker.as_ref(),
            headers,
        )?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            // Worst case is three sequential calls
            deadline: timeout * 3,
        })
    }

    pub fn client(&self) -> &UpstreamClient {
        &self.client
    }

    /// Look up the gene region, retrying by symbol when the identifier is unknown
    pub async fn lookup_region(&self, locus: &GeneLocus) -> Result<GeneRegion, SourceError> {
        let by_id = self
            .client
            .get(&lookup_id_url(&self.base_url, &locus.external_id))
            .await?;

        let response = if by_id.status().is_success() {
            by_id
        } else {
            tracing::debug!(
                id = %locus.external_id,
                status = by_id.status().as_u16(),
                "identifier not recognized, retrying by symbol"
            );
            let url = lookup_symbol_url(&self.base_url, &locus.organism_id, &locus.symbol);
            let by_symbol = self.client.get(&url).await?;
            if !by_symbol.status().is_success() {
                return Err(SourceError::NotFound(format!(
                    "neither '{}' nor symbol '{}' recognized for {}",
                    locus.external_id, locus.symbol, locus.organism_id
                )));
            }
            by_symbol
        };

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        parse_lookup(&body)
    }

    /// Fetch the bases of a region
    pub async fn fetch_region(&self, species: &str, region: &GeneRegion) -> Result<String, SourceError> {
        let response = self
            .client
            .get_success(&region_url(&self.base_url, species, region))
            .await?;
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        parse_sequence(&body)
    }
}

#[async_trait]
impl SequenceSource for EnsemblSource {
    fn name(&self) -> &'static str {
        "ensembl"
    }

    fn deadline(&self) -> Duration {
        self.deadline
    }

    async fn fetch_sequence(&self, locus: &GeneLocus) -> Result<String, SourceError> {
        let region = self.lookup_region(locus).await?;
        tracing::debug!(
            id = %locus.external_id,
            region = %region.to_region_string(),
            "fetching Ensembl region"
        );
        self.fetch_region(&locus.organism_id, &region).await
    }

    async fn health_check(&self) -> Result<(), SourceError> {
        let url = format!("{}/info/ping", self.base_url);
        let body = self
            .client
            .get_success(&url)
            .await?
            .text()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        let ping: PingResponse = serde_json::from_str(&body)
            .map_err(|e| SourceError::Malformed(format!("ping response: {}", e)))?;
        if ping.ping == 1 {
            Ok(())
        } else {
            Err(SourceError::Malformed(format!("ping returned {}", ping.ping)))
        }
    }
}
