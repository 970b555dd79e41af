//! Validated stage transitions over the append-only history
//!
//! All writes for one lead are serialized through a per-lead async mutex,
//! so the read-validate-close-create-update sequence is atomic with
//! respect to other transitions for the same lead. Different leads never
//! contend.

use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use leadflow_core::{
    Error, Lead, LeadStore, OutcomeStage, Result, StageHistoryRecord, StageHistoryStore,
    TransitionReason,
};

/// Executes stage transitions for leads
pub struct StageTransitionEngine {
    leads: Arc<dyn LeadStore>,
    history: Arc<dyn StageHistoryStore>,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl StageTransitionEngine {
    pub fn new(leads: Arc<dyn LeadStore>, history: Arc<dyn StageHistoryStore>) -> Self {
        Self {
            leads,
            history,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, lead_id: Uuid) -> Arc<Mutex<()>> {
        self.locks.entry(lead_id).or_default().clone()
    }

    /// Drop our clone and evict the registry entry if no other task holds
    /// one. Waiters clone under the shard lock before locking the mutex,
    /// so an entry with a single reference has no holder and no waiter.
    fn release_lock(&self, lead_id: Uuid, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks
            .remove_if(&lead_id, |_, existing| Arc::strong_count(existing) == 1);
    }

    async fn require_lead(&self, lead_id: Uuid) -> Result<Lead> {
        self.leads
            .get(lead_id)
            .await?
            .ok_or(Error::LeadNotFound(lead_id))
    }

    /// Close the open history record, append the new one, and update the
    /// denormalized fields on the lead. Caller holds the per-lead lock.
    async fn apply(
        &self,
        lead_id: Uuid,
        new_stage: OutcomeStage,
        previous_stage: Option<OutcomeStage>,
        reason: TransitionReason,
        triggered_by: &str,
        notes: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<StageHistoryRecord> {
        let now = Utc::now();

        self.history.close_open(lead_id, now).await?;

        let record = StageHistoryRecord::open(
            lead_id,
            new_stage,
            previous_stage,
            reason,
            triggered_by,
            notes,
            metadata,
            now,
        );
        self.history.create(record.clone()).await?;
        self.leads.set_stage(lead_id, new_stage, now).await?;

        Ok(record)
    }

    /// Validate and execute a stage transition
    ///
    /// Fails without mutating anything when the lead is unknown, has no
    /// stage yet, or the edge is not in the transition table.
    pub async fn transition(
        &self,
        lead_id: Uuid,
        new_stage: OutcomeStage,
        reason: TransitionReason,
        triggered_by: &str,
        notes: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<StageHistoryRecord> {
        let lock = self.lock_for(lead_id);
        let result = {
            let _guard = lock.lock().await;
            self.transition_locked(lead_id, new_stage, reason, triggered_by, notes, metadata)
                .await
        };
        self.release_lock(lead_id, lock);
        result
    }

    async fn transition_locked(
        &self,
        lead_id: Uuid,
        new_stage: OutcomeStage,
        reason: TransitionReason,
        triggered_by: &str,
        notes: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<StageHistoryRecord> {
        let lead = self.require_lead(lead_id).await?;
        let current = lead
            .current_outcome_stage
            .ok_or(Error::NoStage(lead_id))?;

        if !current.valid_transitions().contains(&new_stage) {
            return Err(Error::invalid_transition(current, new_stage));
        }

        info!(
            lead_id = %lead_id,
            from_stage = %current,
            to_stage = %new_stage,
            reason = reason.as_str(),
            "Transitioning outcome stage"
        );

        self.apply(
            lead_id,
            new_stage,
            Some(current),
            reason,
            triggered_by,
            notes,
            metadata,
        )
        .await
    }

    /// Enter the initial EMAIL_SENT stage after an outreach email goes out
    ///
    /// Idempotent: a lead that already has a stage keeps it, and the
    /// currently open history record is returned instead.
    pub async fn initialize_stage(&self, lead_id: Uuid) -> Result<StageHistoryRecord> {
        let lock = self.lock_for(lead_id);
        let result = {
            let _guard = lock.lock().await;
            self.initialize_stage_locked(lead_id).await
        };
        self.release_lock(lead_id, lock);
        result
    }

    async fn initialize_stage_locked(&self, lead_id: Uuid) -> Result<StageHistoryRecord> {
        let lead = self.require_lead(lead_id).await?;

        if let Some(current) = lead.current_outcome_stage {
            info!(
                lead_id = %lead_id,
                current_stage = %current,
                "Lead already has outcome stage, skipping EMAIL_SENT"
            );
            if let Some(open) = self.history.open_for_lead(lead_id).await? {
                return Ok(open);
            }
        }

        let record = self
            .apply(
                lead_id,
                OutcomeStage::EmailSent,
                None,
                TransitionReason::System,
                "system",
                None,
                None,
            )
            .await?;

        info!(lead_id = %lead_id, "EMAIL_SENT stage set");
        Ok(record)
    }

    /// Move leads stuck in EMAIL_SENT past the cutoff to NO_RESPONSE
    ///
    /// One failed lead does not abort the sweep; the failure is logged and
    /// the remaining leads are still processed. Returns the history records
    /// opened by the sweep.
    pub async fn stale_sweep(&self, stale_after_days: i64) -> Result<Vec<StageHistoryRecord>> {
        let cutoff = Utc::now() - Duration::days(stale_after_days);
        let stale = self
            .leads
            .find_stale_in_stage(OutcomeStage::EmailSent, cutoff)
            .await?;

        let mut transitioned = Vec::new();
        for lead in stale {
            let notes = format!(
                "Auto-transitioned after {} days with no response",
                stale_after_days
            );
            match self
                .transition(
                    lead.id,
                    OutcomeStage::NoResponse,
                    TransitionReason::Automatic,
                    "system",
                    Some(notes),
                    None,
                )
                .await
            {
                Ok(record) => {
                    info!(lead_id = %lead.id, "Auto NO_RESPONSE transition");
                    transitioned.push(record);
                }
                Err(e) => {
                    error!(lead_id = %lead.id, error = %e, "Failed auto NO_RESPONSE");
                }
            }
        }

        info!(transitioned = transitioned.len(), "NO_RESPONSE check completed");
        Ok(transitioned)
    }

    /// Full stage timeline for a lead, oldest first
    pub async fn history(&self, lead_id: Uuid) -> Result<Vec<StageHistoryRecord>> {
        Ok(self.history.history(lead_id).await?)
    }

    /// Current stage and the sorted set of valid next stages
    pub async fn valid_next_stages(
        &self,
        lead_id: Uuid,
    ) -> Result<(Option<OutcomeStage>, Vec<OutcomeStage>)> {
        let lead = self.require_lead(lead_id).await?;
        match lead.current_outcome_stage {
            Some(current) => Ok((Some(current), current.sorted_transitions())),
            None => Ok((None, Vec::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_store::{InMemoryHistoryStore, InMemoryLeadStore};

    fn engine_with_lead(stage: Option<OutcomeStage>) -> (StageTransitionEngine, Uuid) {
        let leads = Arc::new(InMemoryLeadStore::new());
        let history = Arc::new(InMemoryHistoryStore::new());
        let lead = leads.seed("Jane", "Doe", "Acme Corp", Some("SaaS"), Some(55), stage);
        (StageTransitionEngine::new(leads, history), lead)
    }

    #[tokio::test]
    async fn test_valid_transition_updates_everything() {
        let (engine, lead_id) = engine_with_lead(None);
        engine.initialize_stage(lead_id).await.unwrap();

        let record = engine
            .transition(
                lead_id,
                OutcomeStage::Responded,
                TransitionReason::Manual,
                "user",
                None,
                None,
            )
            .await
            .unwrap();

        assert_eq!(record.stage, OutcomeStage::Responded);
        assert_eq!(record.previous_stage, Some(OutcomeStage::EmailSent));
        assert!(record.is_open());

        let timeline = engine.history(lead_id).await.unwrap();
        assert_eq!(timeline.len(), 2);
        assert!(timeline[0].exited_at.is_some());
        assert!(timeline[1].exited_at.is_none());
    }

    #[tokio::test]
    async fn test_invalid_transition_rejected_without_mutation() {
        let (engine, lead_id) = engine_with_lead(None);
        engine.initialize_stage(lead_id).await.unwrap();

        let err = engine
            .transition(
                lead_id,
                OutcomeStage::ClosedWon,
                TransitionReason::Manual,
                "user",
                None,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));

        let timeline = engine.history(lead_id).await.unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].stage, OutcomeStage::EmailSent);
    }

    #[tokio::test]
    async fn test_transition_without_stage_fails() {
        let (engine, lead_id) = engine_with_lead(None);
        let err = engine
            .transition(
                lead_id,
                OutcomeStage::Responded,
                TransitionReason::Manual,
                "user",
                None,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoStage(_)));
    }

    #[tokio::test]
    async fn test_unknown_lead() {
        let (engine, _) = engine_with_lead(None);
        let err = engine.initialize_stage(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::LeadNotFound(_)));
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (engine, lead_id) = engine_with_lead(None);
        let first = engine.initialize_stage(lead_id).await.unwrap();
        let second = engine.initialize_stage(lead_id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(engine.history(lead_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_metadata_stored_on_record() {
        let (engine, lead_id) = engine_with_lead(None);
        engine.initialize_stage(lead_id).await.unwrap();

        let record = engine
            .transition(
                lead_id,
                OutcomeStage::Responded,
                TransitionReason::Automatic,
                "reply_agent",
                None,
                Some(serde_json::json!({"classification_id": "abc"})),
            )
            .await
            .unwrap();

        assert_eq!(
            record.metadata.unwrap()["classification_id"],
            serde_json::json!("abc")
        );
        let timeline = engine.history(lead_id).await.unwrap();
        assert!(timeline[0].metadata.is_none());
    }

    #[tokio::test]
    async fn test_lock_registry_drains_after_use() {
        let (engine, lead_id) = engine_with_lead(None);
        engine.initialize_stage(lead_id).await.unwrap();
        engine
            .transition(
                lead_id,
                OutcomeStage::Responded,
                TransitionReason::Manual,
                "user",
                None,
                None,
            )
            .await
            .unwrap();

        assert!(engine.locks.is_empty());
    }

    #[tokio::test]
    async fn test_valid_next_stages() {
        let (engine, lead_id) = engine_with_lead(Some(OutcomeStage::BookedDemo));
        let (current, next) = engine.valid_next_stages(lead_id).await.unwrap();
        assert_eq!(current, Some(OutcomeStage::BookedDemo));
        assert_eq!(next, vec![OutcomeStage::ClosedLost, OutcomeStage::ClosedWon]);

        let (engine, lead_id) = engine_with_lead(None);
        let (current, next) = engine.valid_next_stages(lead_id).await.unwrap();
        assert_eq!(current, None);
        assert!(next.is_empty());
    }
}
