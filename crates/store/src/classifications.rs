//! In-memory classification store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use leadflow_core::{
    ClassificationRecord, ClassificationStore, ReplyClassification, StoreError,
};

#[derive(Default)]
pub struct InMemoryClassificationStore {
    records: RwLock<Vec<ClassificationRecord>>,
}

impl InMemoryClassificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClassificationStore for InMemoryClassificationStore {
    async fn create(&self, record: ClassificationRecord) -> Result<(), StoreError> {
        self.records.write().push(record);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ClassificationRecord>, StoreError> {
        Ok(self.records.read().iter().find(|r| r.id == id).cloned())
    }

    async fn for_lead(&self, lead_id: Uuid) -> Result<Vec<ClassificationRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .iter()
            .rev()
            .filter(|r| r.lead_id == lead_id)
            .cloned()
            .collect())
    }

    async fn apply_override(
        &self,
        id: Uuid,
        classification: ReplyClassification,
        overridden_by: &str,
        overridden_at: DateTime<Utc>,
    ) -> Result<Option<ClassificationRecord>, StoreError> {
        let mut records = self.records.write();
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        record.overridden_classification = Some(classification);
        record.overridden_by = Some(overridden_by.to_string());
        record.overridden_at = Some(overridden_at);
        Ok(Some(record.clone()))
    }
}
