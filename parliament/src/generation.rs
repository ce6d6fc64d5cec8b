//! Text-generation seam — provider trait, HTTP implementation, usage.
//!
//! The engine consumes generation through `GenerationProvider` and never
//! assumes a particular backend. The shipped implementation speaks the
//! OpenAI-compatible chat completions protocol over reqwest; tests use
//! scripted providers.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::EndpointConfig;

/// Errors from generation calls.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Response parse error: {0}")]
    ParseError(String),
}

/// Token counts reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }

    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// One generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// One generation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub usage: TokenUsage,
}

/// The external text-generation capability.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError>;
}

/// OpenAI-compatible chat completions provider.
pub struct HttpGenerationProvider {
    endpoint: EndpointConfig,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpGenerationProvider {
    pub fn new(endpoint: EndpointConfig, timeout_secs: u64) -> Self {
        Self {
            endpoint,
            timeout_secs,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }
}

#[async_trait]
impl GenerationProvider for HttpGenerationProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": request.prompt }));

        let body = serde_json::json!({
            "model": self.endpoint.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let url = format!("{}/chat/completions", self.endpoint.url.trim_end_matches('/'));
        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.endpoint.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(self.timeout_secs)
            } else {
                GenerationError::RequestFailed(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::RequestFailed(format!(
                "endpoint error ({}): {}",
                status, body
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;

        let text = value["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();
        let usage = TokenUsage {
            prompt_tokens: value["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            completion_tokens: value["usage"]["completion_tokens"].as_u64().unwrap_or(0),
        };

        debug!(
            model = %self.endpoint.model,
            chars = text.len(),
            tokens = usage.total(),
            "Generation completed"
        );

        Ok(Generation { text, usage })
    }
}

/// Lift a JSON payload out of a model response.
///
/// Tries a fenced ```json block first, then falls back to the outermost
/// brace span. Returns `None` when neither is present.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let fence = Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("fence pattern");
    if let Some(captures) = fence.captures(text) {
        if let Some(block) = captures.get(1) {
            let block = block.as_str().trim();
            if !block.is_empty() {
                return Some(block);
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Parse structured JSON out of free-form model text.
///
/// Direct parse first, then the extracted block. Callers treat the
/// error as recoverable and substitute a default value.
pub fn parse_json_lenient<T: DeserializeOwned>(text: &str) -> Result<T, GenerationError> {
    if let Ok(value) = serde_json::from_str::<T>(text.trim()) {
        return Ok(value);
    }
    let block = extract_json_block(text)
        .ok_or_else(|| GenerationError::ParseError("no JSON payload in response".to_string()))?;
    serde_json::from_str(block).map_err(|e| GenerationError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Probe {
        action: String,
        confidence: u8,
    }

    #[test]
    fn test_usage_accumulates() {
        let mut usage = TokenUsage::default();
        usage.add(TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 40,
        });
        usage.add(TokenUsage {
            prompt_tokens: 60,
            completion_tokens: 10,
        });
        assert_eq!(usage.prompt_tokens, 160);
        assert_eq!(usage.completion_tokens, 50);
        assert_eq!(usage.total(), 210);
    }

    #[test]
    fn test_extract_fenced_block() {
        let text = "Here is my answer:\n```json\n{\"action\": \"challenge\"}\n```\nthanks";
        assert_eq!(extract_json_block(text), Some("{\"action\": \"challenge\"}"));
    }

    #[test]
    fn test_extract_unlabeled_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json_block(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_brace_span_fallback() {
        let text = "I think {\"action\": \"defend\", \"confidence\": 70} covers it";
        assert_eq!(
            extract_json_block(text),
            Some("{\"action\": \"defend\", \"confidence\": 70}")
        );
    }

    #[test]
    fn test_extract_none_for_plain_text() {
        assert_eq!(extract_json_block("no structured payload here"), None);
    }

    #[test]
    fn test_lenient_parse_direct() {
        let parsed: Probe =
            parse_json_lenient("{\"action\": \"propose\", \"confidence\": 80}").unwrap();
        assert_eq!(parsed.action, "propose");
        assert_eq!(parsed.confidence, 80);
    }

    #[test]
    fn test_lenient_parse_from_prose() {
        let text = "Sure! ```json\n{\"action\": \"concede\", \"confidence\": 30}\n``` done.";
        let parsed: Probe = parse_json_lenient(text).unwrap();
        assert_eq!(parsed.action, "concede");
    }

    #[test]
    fn test_lenient_parse_failure_is_error() {
        let result: Result<Probe, _> = parse_json_lenient("not json at all");
        assert!(matches!(result, Err(GenerationError::ParseError(_))));
    }
}
