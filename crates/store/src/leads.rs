//! In-memory lead store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use leadflow_core::{Lead, LeadStore, OutcomeStage, StoreError};

#[derive(Default)]
pub struct InMemoryLeadStore {
    leads: RwLock<HashMap<Uuid, Lead>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a lead and return its id
    pub fn seed(
        &self,
        first_name: &str,
        last_name: &str,
        company_name: &str,
        industry: Option<&str>,
        score_value: Option<i32>,
        stage: Option<OutcomeStage>,
    ) -> Uuid {
        let lead = Lead {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            company_name: company_name.to_string(),
            industry: industry.map(str::to_string),
            score_value,
            current_outcome_stage: stage,
            outcome_stage_entered_at: stage.map(|_| Utc::now()),
        };
        let id = lead.id;
        self.leads.write().insert(id, lead);
        id
    }

    /// Rewrite when the lead entered its current stage. Test helper for
    /// exercising the stale sweep without waiting.
    pub fn backdate_stage(&self, lead_id: Uuid, entered_at: DateTime<Utc>) {
        if let Some(lead) = self.leads.write().get_mut(&lead_id) {
            lead.outcome_stage_entered_at = Some(entered_at);
        }
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn get(&self, lead_id: Uuid) -> Result<Option<Lead>, StoreError> {
        Ok(self.leads.read().get(&lead_id).cloned())
    }

    async fn set_stage(
        &self,
        lead_id: Uuid,
        stage: OutcomeStage,
        entered_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut leads = self.leads.write();
        let lead = leads
            .get_mut(&lead_id)
            .ok_or_else(|| StoreError::InvalidData(format!("unknown lead {lead_id}")))?;
        lead.current_outcome_stage = Some(stage);
        lead.outcome_stage_entered_at = Some(entered_at);
        Ok(())
    }

    async fn find_stale_in_stage(
        &self,
        stage: OutcomeStage,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Lead>, StoreError> {
        Ok(self
            .leads
            .read()
            .values()
            .filter(|lead| {
                lead.current_outcome_stage == Some(stage)
                    && lead
                        .outcome_stage_entered_at
                        .map(|at| at <= cutoff)
                        .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}
