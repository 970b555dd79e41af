//! In-memory stage history store
//!
//! Append-only. Closing stamps `exited_at` in place; nothing is ever
//! removed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use leadflow_core::{StageHistoryRecord, StageHistoryStore, StoreError};

#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: RwLock<Vec<StageHistoryRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many records for this lead are still open
    pub fn open_count(&self, lead_id: Uuid) -> usize {
        self.records
            .read()
            .iter()
            .filter(|r| r.lead_id == lead_id && r.is_open())
            .count()
    }
}

#[async_trait]
impl StageHistoryStore for InMemoryHistoryStore {
    async fn create(&self, record: StageHistoryRecord) -> Result<(), StoreError> {
        self.records.write().push(record);
        Ok(())
    }

    async fn close_open(
        &self,
        lead_id: Uuid,
        exited_at: DateTime<Utc>,
    ) -> Result<Option<StageHistoryRecord>, StoreError> {
        let mut records = self.records.write();
        for record in records.iter_mut() {
            if record.lead_id == lead_id && record.is_open() {
                let before = record.clone();
                record.exited_at = Some(exited_at);
                return Ok(Some(before));
            }
        }
        Ok(None)
    }

    async fn open_for_lead(
        &self,
        lead_id: Uuid,
    ) -> Result<Option<StageHistoryRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .iter()
            .find(|r| r.lead_id == lead_id && r.is_open())
            .cloned())
    }

    async fn history(&self, lead_id: Uuid) -> Result<Vec<StageHistoryRecord>, StoreError> {
        // Insertion order is entry order, which keeps equal timestamps stable
        let mut timeline: Vec<StageHistoryRecord> = self
            .records
            .read()
            .iter()
            .filter(|r| r.lead_id == lead_id)
            .cloned()
            .collect();
        timeline.sort_by_key(|r| r.entered_at);
        Ok(timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::{OutcomeStage, TransitionReason};

    fn record(lead_id: Uuid, stage: OutcomeStage) -> StageHistoryRecord {
        StageHistoryRecord::open(
            lead_id,
            stage,
            None,
            TransitionReason::System,
            "system",
            None,
            None,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_close_open_returns_prior_state() {
        let store = InMemoryHistoryStore::new();
        let lead_id = Uuid::new_v4();
        store
            .create(record(lead_id, OutcomeStage::EmailSent))
            .await
            .unwrap();

        let closed = store.close_open(lead_id, Utc::now()).await.unwrap().unwrap();
        assert!(closed.is_open());
        assert_eq!(store.open_count(lead_id), 0);

        // Nothing left to close
        assert!(store.close_open(lead_id, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_history_scoped_to_lead() {
        let store = InMemoryHistoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.create(record(a, OutcomeStage::EmailSent)).await.unwrap();
        store.create(record(b, OutcomeStage::EmailSent)).await.unwrap();

        assert_eq!(store.history(a).await.unwrap().len(), 1);
        assert_eq!(store.open_for_lead(b).await.unwrap().unwrap().lead_id, b);
    }
}
