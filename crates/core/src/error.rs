//! Error taxonomy for the lead outcome engine
//!
//! Not-found and invalid-transition errors propagate to the caller with no
//! state mutated. Classification degradation (LLM failure) is recovered
//! inside the classifier and never appears here.

use thiserror::Error;
use uuid::Uuid;

use crate::stage::OutcomeStage;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure raised by a store implementation
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Engine errors
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Lead {0} not found")]
    LeadNotFound(Uuid),

    #[error("Classification {0} not found")]
    ClassificationNotFound(Uuid),

    #[error("Lead {0} has no outcome stage yet. Email must be sent first.")]
    NoStage(Uuid),

    #[error(
        "Invalid transition from {from} to {requested}. Valid transitions: {}",
        format_allowed(.allowed)
    )]
    InvalidTransition {
        from: OutcomeStage,
        requested: OutcomeStage,
        /// Sorted by wire name for deterministic error text
        allowed: Vec<OutcomeStage>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub fn invalid_transition(from: OutcomeStage, requested: OutcomeStage) -> Self {
        Self::InvalidTransition {
            from,
            requested,
            allowed: from.sorted_transitions(),
        }
    }
}

fn format_allowed(allowed: &[OutcomeStage]) -> String {
    if allowed.is_empty() {
        return "none (terminal stage)".to_string();
    }
    allowed
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message_sorted() {
        let err = Error::invalid_transition(OutcomeStage::EmailSent, OutcomeStage::ClosedWon);
        let text = err.to_string();
        assert!(text.contains("Invalid transition from EMAIL_SENT to CLOSED_WON"));
        assert!(text.contains("CLOSED_LOST, DISQUALIFIED, NO_RESPONSE, RESPONDED"));
    }

    #[test]
    fn test_terminal_stage_message() {
        let err = Error::invalid_transition(OutcomeStage::ClosedWon, OutcomeStage::EmailSent);
        assert!(err.to_string().contains("none (terminal stage)"));
    }
}
