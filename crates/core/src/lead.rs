//! Lead aggregate and outcome feedback types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stage::OutcomeStage;

/// Lead aggregate, owned by the outer CRM domain
///
/// The engine mutates only `current_outcome_stage` and
/// `outcome_stage_entered_at`; everything else is read-only context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub industry: Option<String>,
    /// Lead score assigned by the scoring pipeline, 0-100
    pub score_value: Option<i32>,
    pub current_outcome_stage: Option<OutcomeStage>,
    /// Meaningful iff `current_outcome_stage` is set
    pub outcome_stage_entered_at: Option<DateTime<Utc>>,
}

impl Lead {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Read-only slice of a lead used as prompt context for classification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadContext {
    pub name: String,
    pub company: String,
    pub industry: Option<String>,
    pub current_stage: Option<OutcomeStage>,
}

impl From<&Lead> for LeadContext {
    fn from(lead: &Lead) -> Self {
        Self {
            name: lead.full_name(),
            company: lead.company_name.clone(),
            industry: lead.industry.clone(),
            current_stage: lead.current_outcome_stage,
        }
    }
}

/// Outcome fed back into the scoring weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadOutcome {
    BookedDemo,
    ClosedWon,
    NoResponse,
    ClosedLost,
    Disqualified,
}

impl LeadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BookedDemo => "booked_demo",
            Self::ClosedWon => "closed_won",
            Self::NoResponse => "no_response",
            Self::ClosedLost => "closed_lost",
            Self::Disqualified => "disqualified",
        }
    }

    /// The score should have been high for these
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::BookedDemo | Self::ClosedWon)
    }

    /// The score should have been low for these
    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            Self::NoResponse | Self::ClosedLost | Self::Disqualified
        )
    }

    /// Map a stage entry to the outcome used by scoring feedback
    pub fn from_stage(stage: OutcomeStage) -> Option<Self> {
        match stage {
            OutcomeStage::BookedDemo => Some(Self::BookedDemo),
            OutcomeStage::ClosedWon => Some(Self::ClosedWon),
            OutcomeStage::NoResponse => Some(Self::NoResponse),
            OutcomeStage::ClosedLost => Some(Self::ClosedLost),
            OutcomeStage::Disqualified => Some(Self::Disqualified),
            OutcomeStage::EmailSent | OutcomeStage::Responded => None,
        }
    }
}

impl std::fmt::Display for LeadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_sentiment() {
        assert!(LeadOutcome::BookedDemo.is_positive());
        assert!(LeadOutcome::ClosedWon.is_positive());
        assert!(LeadOutcome::NoResponse.is_negative());
        assert!(LeadOutcome::ClosedLost.is_negative());
        assert!(LeadOutcome::Disqualified.is_negative());
    }

    #[test]
    fn test_from_stage() {
        assert_eq!(
            LeadOutcome::from_stage(OutcomeStage::ClosedWon),
            Some(LeadOutcome::ClosedWon)
        );
        assert_eq!(LeadOutcome::from_stage(OutcomeStage::EmailSent), None);
        assert_eq!(LeadOutcome::from_stage(OutcomeStage::Responded), None);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&LeadOutcome::BookedDemo).unwrap();
        assert_eq!(json, "\"booked_demo\"");
    }
}
