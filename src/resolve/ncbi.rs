//! NCBI E-utilities sequence source
//!
//! `esearch` finds the first nucleotide record for
//! `"{symbol}[Gene Name] AND {organism}[Organism]"`, then `efetch` returns it
//! as FASTA and the first record's bases are used.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::config::NcbiConfig;
use crate::fasta;
use crate::locus::GeneLocus;
use crate::resolve::http_client::UpstreamClient;
use crate::resolve::{SequenceSource, SourceError};

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(rename = "ERROR", default)]
    error: Option<String>,
}

/// Entrez query for a gene symbol within an organism
pub fn search_term(symbol: &str, organism: &str) -> String {
    format!("{}[Gene Name] AND {}[Organism]", symbol, organism)
}

/// Extract the first record id from an esearch JSON body
pub fn parse_esearch(body: &str) -> Result<Option<String>, SourceError> {
    let response: ESearchResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::Malformed(format!("esearch response: {}", e)))?;
    if let Some(error) = response.esearchresult.error {
        return Err(SourceError::Malformed(format!("esearch error: {}", error)));
    }
    Ok(response.esearchresult.idlist.into_iter().next())
}

/// Extract the first record's bases from an efetch FASTA body
pub fn parse_efetch(body: &str) -> Result<String, SourceError> {
    fasta::first_sequence(body).map_err(|e| SourceError::Malformed(e.to_string()))
}

/// NCBI E-utilities source
#[derive(Debug)]
pub struct NcbiSource {
    client: UpstreamClient,
    base_url: String,
    database: String,
    tool: String,
    email: Option<String>,
    api_key: Option<String>,
    deadline: Duration,
}

impl NcbiSource {
    pub fn new(config: &NcbiConfig) -> Result<Self, SourceError> {
        let timeout = Duration::from_secs(config.timeout_seconds.max(1));
        let client = UpstreamClient::new(
            "ncbi",
            timeout,
            config.rate_limit_ms,
            config.circuit_breaker.as_ref(),
            HeaderMap::new(),
        )?;
        if config.email.is_none() {
            tracing::debug!("NCBI contact email not configured");
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
            tool: config.tool.clone(),
            email: config.email.clone(),
            api_key: config.api_key.clone(),
            // esearch then efetch
            deadline: timeout * 2,
        })
    }

    pub fn client(&self) -> &UpstreamClient {
        &self.client
    }

    /// Identification parameters NCBI asks every E-utilities client to send
    fn identity_params(&self) -> String {
        let mut params = format!("&tool={}", urlencoding::encode(&self.tool));
        if let Some(email) = &self.email {
            params.push_str(&format!("&email={}", urlencoding::encode(email)));
        }
        if let Some(api_key) = &self.api_key {
            params.push_str(&format!("&api_key={}", urlencoding::encode(api_key)));
        }
        params
    }

    pub fn esearch_url(&self, term: &str) -> String {
        format!(
            "{}/esearch.fcgi?db={}&term={}&retmax=1&retmode=json{}",
            self.base_url,
            urlencoding::encode(&self.database),
            urlencoding::encode(term),
            self.identity_params()
        )
    }

    pub fn efetch_url(&self, id: &str) -> String {
        format!(
            "{}/efetch.fcgi?db={}&id={}&rettype=fasta&retmode=text{}",
            self.base_url,
            urlencoding::encode(&self.database),
            urlencoding::encode(id),
            self.identity_params()
        )
    }

    /// First matching record id, if any
    pub async fn search(&self, locus: &GeneLocus) -> Result<Option<String>, SourceError> {
        let term = search_term(&locus.symbol, &locus.organism_name());
        let body = self
            .client
            .get_success(&self.esearch_url(&term))
            .await?
            .text()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        parse_esearch(&body)
    }

    /// Fetch one record as FASTA and return its bases
    pub async fn fetch_record(&self, id: &str) -> Result<String, SourceError> {
        let body = self
            .client
            .get_success(&self.efetch_url(id))
            .await?
            .text()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        parse_efetch(&body)
    }
}

#[async_trait]
impl SequenceSource for NcbiSource {
    fn name(&self) -> &'static str {
        "ncbi"
    }

    fn deadline(&self) -> Duration {
        self.deadline
    }

    async fn fetch_sequence(&self, locus: &GeneLocus) -> Result<String, SourceError> {
        let id = self.search(locus).await?.ok_or_else(|| {
            SourceError::NotFound(search_term(&locus.symbol, &locus.organism_name()))
        })?;
        tracing::debug!(symbol = %locus.symbol, record = %id, "fetching NCBI record");
        self.fetch_record(&id).await
    }

    async fn health_check(&self) -> Result<(), SourceError> {
        let url = format!("{}/einfo.fcgi?retmode=json{}", self.base_url, self.identity_params());
        self.client.get_success(&url).await.map(|_| ())
    }
}
