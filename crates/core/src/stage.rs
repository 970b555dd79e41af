//! Outcome stages and the stage history record
//!
//! An outcome stage is a named phase in a lead's post-outreach lifecycle.
//! The adjacency table lives on the enum so every caller validates against
//! the same set of edges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome stage of a lead after initial outreach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStage {
    /// Outreach email confirmed sent
    EmailSent,
    /// Lead replied
    Responded,
    /// No reply after the stale cutoff
    NoResponse,
    /// Demo meeting booked
    BookedDemo,
    /// Deal won (terminal)
    ClosedWon,
    /// Deal lost
    ClosedLost,
    /// Lead opted out or is not a fit
    Disqualified,
}

impl OutcomeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailSent => "EMAIL_SENT",
            Self::Responded => "RESPONDED",
            Self::NoResponse => "NO_RESPONSE",
            Self::BookedDemo => "BOOKED_DEMO",
            Self::ClosedWon => "CLOSED_WON",
            Self::ClosedLost => "CLOSED_LOST",
            Self::Disqualified => "DISQUALIFIED",
        }
    }

    /// All valid transitions from this stage
    pub fn valid_transitions(&self) -> &'static [OutcomeStage] {
        match self {
            Self::EmailSent => &[
                Self::Responded,
                Self::NoResponse,
                Self::Disqualified,
                Self::ClosedLost,
            ],
            Self::Responded => &[Self::BookedDemo, Self::ClosedLost, Self::Disqualified],
            Self::BookedDemo => &[Self::ClosedWon, Self::ClosedLost],
            Self::NoResponse => &[Self::Responded],
            Self::ClosedWon => &[],
            // Re-engagement edges
            Self::ClosedLost => &[Self::Responded],
            Self::Disqualified => &[Self::Responded],
        }
    }

    /// Whether the stage has no outgoing transitions
    pub fn is_terminal_edge(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Stages that trigger a learning weight update when entered
    pub fn triggers_feedback(&self) -> bool {
        matches!(self, Self::ClosedWon | Self::ClosedLost | Self::Disqualified)
    }

    /// Allowed next stages, sorted by wire name for deterministic error text
    pub fn sorted_transitions(&self) -> Vec<OutcomeStage> {
        let mut next = self.valid_transitions().to_vec();
        next.sort_by_key(|s| s.as_str());
        next
    }
}

impl std::fmt::Display for OutcomeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a transition was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionReason {
    /// A user moved the lead by hand
    Manual,
    /// The reply router or stale sweep moved the lead
    Automatic,
    /// Lifecycle bookkeeping (initial EMAIL_SENT entry)
    System,
}

impl TransitionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Automatic => "AUTOMATIC",
            Self::System => "SYSTEM",
        }
    }
}

/// One row of a lead's stage timeline
///
/// Immutable once closed. For a given lead exactly one record has
/// `exited_at = None` at any time, and its `stage` equals the lead's
/// denormalized `current_outcome_stage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageHistoryRecord {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub stage: OutcomeStage,
    pub previous_stage: Option<OutcomeStage>,
    pub reason: TransitionReason,
    pub triggered_by: String,
    pub notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
}

impl StageHistoryRecord {
    pub fn open(
        lead_id: Uuid,
        stage: OutcomeStage,
        previous_stage: Option<OutcomeStage>,
        reason: TransitionReason,
        triggered_by: &str,
        notes: Option<String>,
        metadata: Option<serde_json::Value>,
        entered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_id,
            stage,
            previous_stage,
            reason,
            triggered_by: triggered_by.to_string(),
            notes,
            metadata,
            entered_at,
            exited_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.exited_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_won_is_terminal() {
        assert!(OutcomeStage::ClosedWon.is_terminal_edge());
        assert!(OutcomeStage::ClosedWon.valid_transitions().is_empty());
    }

    #[test]
    fn test_reengagement_edges() {
        assert!(OutcomeStage::ClosedLost
            .valid_transitions()
            .contains(&OutcomeStage::Responded));
        assert!(OutcomeStage::Disqualified
            .valid_transitions()
            .contains(&OutcomeStage::Responded));
        // Re-engaging does not mean terminal-for-feedback
        assert!(OutcomeStage::ClosedLost.triggers_feedback());
    }

    #[test]
    fn test_no_self_loops() {
        for stage in [
            OutcomeStage::EmailSent,
            OutcomeStage::Responded,
            OutcomeStage::NoResponse,
            OutcomeStage::BookedDemo,
            OutcomeStage::ClosedWon,
            OutcomeStage::ClosedLost,
            OutcomeStage::Disqualified,
        ] {
            assert!(!stage.valid_transitions().contains(&stage));
        }
    }

    #[test]
    fn test_sorted_transitions_deterministic() {
        let next = OutcomeStage::EmailSent.sorted_transitions();
        let names: Vec<&str> = next.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec!["CLOSED_LOST", "DISQUALIFIED", "NO_RESPONSE", "RESPONDED"]
        );
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&OutcomeStage::EmailSent).unwrap();
        assert_eq!(json, "\"EMAIL_SENT\"");
        let back: OutcomeStage = serde_json::from_str("\"BOOKED_DEMO\"").unwrap();
        assert_eq!(back, OutcomeStage::BookedDemo);
    }
}
