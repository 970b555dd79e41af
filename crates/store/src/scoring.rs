//! In-memory scoring config store
//!
//! Rows append in creation order; the latest row is the active config.

use async_trait::async_trait;
use parking_lot::RwLock;

use leadflow_core::{ScoringConfigRecord, ScoringConfigStore, StoreError};

#[derive(Default)]
pub struct InMemoryScoringConfigStore {
    rows: RwLock<Vec<ScoringConfigRecord>>,
}

impl InMemoryScoringConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }
}

#[async_trait]
impl ScoringConfigStore for InMemoryScoringConfigStore {
    async fn create(&self, record: ScoringConfigRecord) -> Result<(), StoreError> {
        self.rows.write().push(record);
        Ok(())
    }

    async fn latest(&self) -> Result<Option<ScoringConfigRecord>, StoreError> {
        Ok(self.rows.read().last().cloned())
    }
}
