//! LLM backend for reply classification
//!
//! Speaks the OpenAI chat completions wire format, which also covers
//! Ollama, vLLM and other local servers. The model is asked for strict
//! JSON; anything that does not parse into a known category is an
//! `InvalidResponse` and the caller falls back to rules.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use leadflow_core::{ClassificationOutcome, ReplyClassification};

use crate::ClassifierError;

/// Backend connection settings
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Chat completions endpoint URL
    pub endpoint: String,
    /// API key, optional for local servers
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/v1/chat/completions".to_string(),
            api_key: None,
            model: "qwen2.5:7b-instruct".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// A backend able to turn a prompt into a structured classification
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    async fn classify(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<ClassificationOutcome, ClassifierError>;

    fn model_name(&self) -> &str;
}

/// OpenAI-compatible chat completions backend
pub struct OpenAiBackend {
    config: BackendConfig,
    client: Client,
}

impl OpenAiBackend {
    pub fn new(config: BackendConfig) -> Result<Self, ClassifierError> {
        if config.endpoint.is_empty() {
            return Err(ClassifierError::Configuration(
                "endpoint must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ClassifierError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::HeaderValue;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(ref key) = self.config.api_key {
            let auth_value = format!("Bearer {}", key);
            if let Ok(val) = HeaderValue::from_str(&auth_value) {
                headers.insert(reqwest::header::AUTHORIZATION, val);
            }
        }
        headers
    }
}

#[async_trait]
impl ClassifierBackend for OpenAiBackend {
    async fn classify(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<ClassificationOutcome, ClassifierError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: Some(0.0),
            stream: Some(false),
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .headers(self.build_headers())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| ClassifierError::InvalidResponse("No choices in response".to_string()))?;

        parse_outcome(&choice.message.content)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Parse the model's JSON reply into a classification outcome
///
/// Tolerates markdown code fences around the JSON but nothing else.
pub(crate) fn parse_outcome(content: &str) -> Result<ClassificationOutcome, ClassifierError> {
    let json = strip_code_fences(content);

    let raw: RawOutcome = serde_json::from_str(json)
        .map_err(|e| ClassifierError::InvalidResponse(format!("Malformed JSON: {}", e)))?;

    let classification = ReplyClassification::parse(&raw.classification).ok_or_else(|| {
        ClassifierError::InvalidResponse(format!(
            "Unknown classification '{}'",
            raw.classification
        ))
    })?;

    Ok(ClassificationOutcome {
        classification,
        confidence: raw.confidence.clamp(0.0, 1.0),
        reasoning: raw.reasoning,
        extracted_dates: raw.extracted_dates,
        is_auto_reply: raw.is_auto_reply,
    })
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct RawOutcome {
    classification: String,
    confidence: f32,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    extracted_dates: Vec<String>,
    #[serde(default)]
    is_auto_reply: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let outcome = parse_outcome(
            r#"{"classification": "QUESTION", "confidence": 0.82, "reasoning": "asks about pricing", "extracted_dates": [], "is_auto_reply": false}"#,
        )
        .unwrap();
        assert_eq!(outcome.classification, ReplyClassification::Question);
        assert!((outcome.confidence - 0.82).abs() < 1e-6);
    }

    #[test]
    fn test_parse_fenced_json() {
        let outcome = parse_outcome(
            "```json\n{\"classification\": \"UNSUBSCRIBE\", \"confidence\": 0.95}\n```",
        )
        .unwrap();
        assert_eq!(outcome.classification, ReplyClassification::Unsubscribe);
        assert_eq!(outcome.reasoning, "");
        assert!(outcome.extracted_dates.is_empty());
    }

    #[test]
    fn test_parse_clamps_confidence() {
        let outcome =
            parse_outcome(r#"{"classification": "UNCLEAR", "confidence": 1.7}"#).unwrap();
        assert_eq!(outcome.confidence, 1.0);
    }

    #[test]
    fn test_parse_unknown_category() {
        let err = parse_outcome(r#"{"classification": "MAYBE", "confidence": 0.5}"#).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_outcome("I think this is a question.").is_err());
    }

    #[test]
    fn test_backend_requires_endpoint() {
        let config = BackendConfig {
            endpoint: String::new(),
            ..Default::default()
        };
        assert!(OpenAiBackend::new(config).is_err());
    }
}
