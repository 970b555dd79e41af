//! Classifier trait and implementations
//!
//! `ReplyClassifier::classify` is infallible: the LLM-backed classifier
//! degrades to the rule engine on timeout, transport failure or malformed
//! output, and the rule engine always produces something.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use leadflow_core::{ClassificationOutcome, LeadContext};

use crate::backend::ClassifierBackend;
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::rules::classify_with_rules;
use crate::ClassifierError;

/// Turns a reply body plus lead context into a classification outcome
#[async_trait]
pub trait ReplyClassifier: Send + Sync {
    async fn classify(&self, reply_body: &str, context: &LeadContext) -> ClassificationOutcome;
}

/// Rules-only classifier
pub struct RuleBasedClassifier;

#[async_trait]
impl ReplyClassifier for RuleBasedClassifier {
    async fn classify(&self, reply_body: &str, _context: &LeadContext) -> ClassificationOutcome {
        classify_with_rules(reply_body)
    }
}

/// LLM classifier with mandatory rule fallback
pub struct LlmBackedClassifier {
    backend: Arc<dyn ClassifierBackend>,
    timeout: Duration,
    prompt_reply_chars: usize,
}

impl LlmBackedClassifier {
    pub fn new(
        backend: Arc<dyn ClassifierBackend>,
        timeout: Duration,
        prompt_reply_chars: usize,
    ) -> Self {
        Self {
            backend,
            timeout,
            prompt_reply_chars,
        }
    }

    async fn try_llm(
        &self,
        reply_body: &str,
        context: &LeadContext,
    ) -> Result<ClassificationOutcome, ClassifierError> {
        let prompt = build_prompt(reply_body, context, self.prompt_reply_chars);
        tokio::time::timeout(self.timeout, self.backend.classify(SYSTEM_PROMPT, &prompt))
            .await
            .map_err(|_| ClassifierError::Timeout)?
    }
}

#[async_trait]
impl ReplyClassifier for LlmBackedClassifier {
    async fn classify(&self, reply_body: &str, context: &LeadContext) -> ClassificationOutcome {
        match self.try_llm(reply_body, context).await {
            Ok(outcome) => {
                debug!(
                    model = self.backend.model_name(),
                    classification = %outcome.classification,
                    confidence = outcome.confidence,
                    "LLM classification succeeded"
                );
                outcome
            }
            Err(e) => {
                warn!(
                    model = self.backend.model_name(),
                    error = %e,
                    "LLM classification failed, using rules"
                );
                classify_with_rules(reply_body)
            }
        }
    }
}
