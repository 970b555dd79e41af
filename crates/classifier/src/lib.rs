//! Inbound reply classification
//!
//! Two classifiers share one trait: a rule engine built on regex pattern
//! families, and an LLM-backed classifier that falls back to the rules on
//! any backend failure. Classification is infallible by construction; a
//! degraded LLM never surfaces as an error to callers.

pub mod backend;
pub mod classify;
pub mod prompt;
pub mod rules;

pub use backend::{BackendConfig, ClassifierBackend, OpenAiBackend};
pub use classify::{LlmBackedClassifier, ReplyClassifier, RuleBasedClassifier};
pub use rules::{classify_with_rules, extract_dates};

use thiserror::Error;

/// Errors internal to the LLM classification path
///
/// These never escape `LlmBackedClassifier`; they exist so the backend and
/// the fallback logging have something structured to work with.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ClassifierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClassifierError::Timeout
        } else {
            ClassifierError::Network(err.to_string())
        }
    }
}
