//! Plain-language explanation of an analysis
//!
//! The explanation is advisory. Generator failures never fail a request:
//! [`explain_or_placeholder`] turns any [`ExplanationFailure`] into a visible
//! placeholder string and the guide results are returned unchanged.

pub mod gemini;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::locus::GeneRef;

pub use gemini::GeminiExplainer;

/// Prefix of the text returned in place of an explanation
pub const PLACEHOLDER_PREFIX: &str = "Explanation unavailable";

/// Why no explanation could be produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplanationFailure {
    #[error("no explanation generator configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("empty response ({0})")]
    Empty(String),

    #[error("timed out")]
    Timeout,
}

/// Facts handed to the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationRequest {
    pub crop: String,
    pub trait_name: String,
    pub gene: GeneRef,
    /// Resolved sequence length in bp, when known
    pub sequence_length: Option<usize>,
}

/// Produces free-text guidance for a (crop, trait, gene) analysis
#[async_trait]
pub trait ExplanationGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Upper bound on one call
    fn deadline(&self) -> Duration {
        Duration::from_secs(60)
    }

    async fn explain(&self, request: &ExplanationRequest) -> Result<String, ExplanationFailure>;
}

/// Prompt sent to a text generator
pub fn build_prompt(request: &ExplanationRequest) -> String {
    let length = request
        .sequence_length
        .map(|len| len.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "You are a CRISPR genome-editing assistant writing for farmers.\n\
         \n\
         Crop: {crop}\n\
         Trait: {trait_name}\n\
         Gene: {symbol} ({id})\n\
         Length: {length} bp\n\
         \n\
         Cover, in short sections:\n\
         1. Why this gene matters\n\
         2. How editing it helps\n\
         3. Field examples\n\
         4. What's next\n\
         \n\
         Keep it easy to understand.",
        crop = request.crop,
        trait_name = request.trait_name,
        symbol = request.gene.symbol,
        id = request.gene.external_id,
        length = length,
    )
}

/// Visible text substituted for a failed explanation
pub fn placeholder(failure: &ExplanationFailure) -> String {
    format!("{}: {}", PLACEHOLDER_PREFIX, failure)
}

/// Run the generator under its deadline, falling back to the placeholder
///
/// Returns the text and whether it came from the generator.
pub async fn explain_or_placeholder(
    generator: Option<&dyn ExplanationGenerator>,
    request: &ExplanationRequest,
) -> (String, bool) {
    let Some(generator) = generator else {
        return (placeholder(&ExplanationFailure::NotConfigured), false);
    };

    let outcome = match tokio::time::timeout(generator.deadline(), generator.explain(request)).await
    {
        Ok(result) => result,
        Err(_) => Err(ExplanationFailure::Timeout),
    };

    match outcome {
        Ok(text) => (text, true),
        Err(failure) => {
            tracing::warn!(
                generator = generator.name(),
                crop = %request.crop,
                trait_name = %request.trait_name,
                "explanation failed: {}",
                failure
            );
            (placeholder(&failure), false)
        }
    }
}
