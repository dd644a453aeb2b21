//! Gemini `generateContent` client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ExplanationConfig;
use crate::explain::{build_prompt, ExplanationFailure, ExplanationGenerator, ExplanationRequest};

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Extract the generated text from a `generateContent` response body
///
/// Text parts of the first candidate are concatenated. A blocked prompt, a
/// candidate without text, or a body that does not have the expected shape
/// is a failure.
pub fn parse_generate_response(body: &str) -> Result<String, ExplanationFailure> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ExplanationFailure::Malformed(e.to_string()))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ExplanationFailure::Empty(format!("prompt blocked: {}", reason)));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ExplanationFailure::Empty("no candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "no text".to_string());
        return Err(ExplanationFailure::Empty(reason));
    }
    Ok(text)
}

/// Explanation generator backed by the Generative Language API
pub struct GeminiExplainer {
    client: Client,
    endpoint: String,
    api_key: String,
    deadline: Duration,
}

impl std::fmt::Debug for GeminiExplainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiExplainer")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl GeminiExplainer {
    pub fn new(
        api_url: &str,
        model: &str,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, ExplanationFailure> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExplanationFailure::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                api_url.trim_end_matches('/'),
                urlencoding::encode(model)
            ),
            api_key,
            deadline: timeout,
        })
    }

    /// Build from configuration, reading the API key from the configured environment variable
    ///
    /// Returns `Ok(None)` when explanations are disabled or no key is set.
    pub fn from_config(config: &ExplanationConfig) -> Result<Option<Self>, ExplanationFailure> {
        if !config.enabled {
            tracing::info!("Explanations disabled by configuration");
            return Ok(None);
        }
        let api_key = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                tracing::warn!(
                    "{} not set; explanations will be replaced by a placeholder",
                    config.api_key_env
                );
                return Ok(None);
            }
        };
        Self::new(
            &config.api_url,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_seconds.max(1)),
        )
        .map(Some)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExplanationGenerator for GeminiExplainer {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn deadline(&self) -> Duration {
        self.deadline
    }

    async fn explain(&self, request: &ExplanationRequest) -> Result<String, ExplanationFailure> {
        let prompt = build_prompt(request);
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: &prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExplanationFailure::Timeout
                } else {
                    ExplanationFailure::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExplanationFailure::HttpStatus {
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ExplanationFailure::Request(e.to_string()))?;
        parse_generate_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "DREB1A is a "}, {"text": "drought regulator."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"totalTokenCount": 42}
        }"#;
        assert_eq!(
            parse_generate_response(body).unwrap(),
            "DREB1A is a drought regulator."
        );
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        assert_eq!(
            parse_generate_response(body),
            Err(ExplanationFailure::Empty("prompt blocked: SAFETY".to_string()))
        );
    }

    #[test]
    fn test_parse_candidate_without_text() {
        let body = r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#;
        assert_eq!(
            parse_generate_response(body),
            Err(ExplanationFailure::Empty("MAX_TOKENS".to_string()))
        );
        assert!(matches!(
            parse_generate_response(r#"{"candidates": []}"#),
            Err(ExplanationFailure::Empty(_))
        ));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_generate_response("<html>502</html>"),
            Err(ExplanationFailure::Malformed(_))
        ));
        assert!(matches!(
            parse_generate_response(r#"{"candidates": "nope"}"#),
            Err(ExplanationFailure::Malformed(_))
        ));
    }

    #[test]
    fn test_endpoint() {
        let gemini = GeminiExplainer::new(
            "https://generativelanguage.googleapis.com/",
            "gemini-2.5-flash",
            "key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            gemini.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_disabled_config_yields_none() {
        let config = ExplanationConfig {
            enabled: false,
            ..ExplanationConfig::default()
        };
        assert!(GeminiExplainer::from_config(&config).unwrap().is_none());

        let config = ExplanationConfig {
            api_key_env: "AGRO_GRNA_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ExplanationConfig::default()
        };
        assert!(GeminiExplainer::from_config(&config).unwrap().is_none());
    }
}
