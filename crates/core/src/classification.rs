//! Reply classification types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored reply bodies are truncated to this many characters
pub const MAX_REPLY_CHARS: usize = 2000;

/// Category assigned to an inbound reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplyClassification {
    InterestedBookDemo,
    NotInterested,
    Question,
    OutOfOffice,
    Unsubscribe,
    Unclear,
}

impl ReplyClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InterestedBookDemo => "INTERESTED_BOOK_DEMO",
            Self::NotInterested => "NOT_INTERESTED",
            Self::Question => "QUESTION",
            Self::OutOfOffice => "OUT_OF_OFFICE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Unclear => "UNCLEAR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INTERESTED_BOOK_DEMO" => Some(Self::InterestedBookDemo),
            "NOT_INTERESTED" => Some(Self::NotInterested),
            "QUESTION" => Some(Self::Question),
            "OUT_OF_OFFICE" => Some(Self::OutOfOffice),
            "UNSUBSCRIBE" => Some(Self::Unsubscribe),
            "UNCLEAR" => Some(Self::Unclear),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReplyClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result produced by a classifier (rules or LLM) before persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    pub classification: ReplyClassification,
    /// Confidence in [0, 1]
    pub confidence: f32,
    pub reasoning: String,
    /// Raw date-like substrings in text order
    pub extracted_dates: Vec<String>,
    pub is_auto_reply: bool,
}

/// Persisted classification, created once per inbound reply
///
/// An override stamps the `overridden_*` fields; the machine output in
/// `classification` is preserved for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub reply_body: String,
    pub classification: ReplyClassification,
    pub confidence: f32,
    pub reasoning: String,
    pub extracted_dates: Vec<String>,
    pub is_auto_reply: bool,
    pub overridden_by: Option<String>,
    pub overridden_classification: Option<ReplyClassification>,
    pub overridden_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ClassificationRecord {
    pub fn new(lead_id: Uuid, reply_body: &str, outcome: &ClassificationOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_id,
            reply_body: truncate_chars(reply_body, MAX_REPLY_CHARS),
            classification: outcome.classification,
            confidence: outcome.confidence,
            reasoning: outcome.reasoning.clone(),
            extracted_dates: outcome.extracted_dates.clone(),
            is_auto_reply: outcome.is_auto_reply,
            overridden_by: None,
            overridden_classification: None,
            overridden_at: None,
            created_at: Utc::now(),
        }
    }

    /// The classification in effect: the override if present, else the
    /// machine output
    pub fn effective_classification(&self) -> ReplyClassification {
        self.overridden_classification.unwrap_or(self.classification)
    }
}

/// Truncate on a character boundary, never mid-codepoint
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.chars().take(max_chars).collect()
}
