//! Persistence traits
//!
//! Implementations decide the backing store. The engine only depends on
//! these contracts, so tests run against in-memory adapters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::classification::{ClassificationRecord, ReplyClassification};
use crate::error::StoreError;
use crate::lead::Lead;
use crate::scoring::ScoringConfigRecord;
use crate::stage::{OutcomeStage, StageHistoryRecord};

/// Access to the lead aggregate
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn get(&self, lead_id: Uuid) -> Result<Option<Lead>, StoreError>;

    /// Update the denormalized stage fields on the lead row
    async fn set_stage(
        &self,
        lead_id: Uuid,
        stage: OutcomeStage,
        entered_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Leads sitting in `stage` whose stage entry predates `cutoff`
    async fn find_stale_in_stage(
        &self,
        stage: OutcomeStage,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Lead>, StoreError>;
}

/// Append-only stage timeline
#[async_trait]
pub trait StageHistoryStore: Send + Sync {
    async fn create(&self, record: StageHistoryRecord) -> Result<(), StoreError>;

    /// Stamp `exited_at` on the lead's open record, if any.
    /// Returns the record as it was before closing.
    async fn close_open(
        &self,
        lead_id: Uuid,
        exited_at: DateTime<Utc>,
    ) -> Result<Option<StageHistoryRecord>, StoreError>;

    /// The record with `exited_at = None`, if any
    async fn open_for_lead(&self, lead_id: Uuid)
        -> Result<Option<StageHistoryRecord>, StoreError>;

    /// Full timeline, oldest first
    async fn history(&self, lead_id: Uuid) -> Result<Vec<StageHistoryRecord>, StoreError>;
}

/// Persisted reply classifications
#[async_trait]
pub trait ClassificationStore: Send + Sync {
    async fn create(&self, record: ClassificationRecord) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<ClassificationRecord>, StoreError>;

    /// All classifications for a lead, newest first
    async fn for_lead(&self, lead_id: Uuid) -> Result<Vec<ClassificationRecord>, StoreError>;

    /// Stamp the override fields; machine output stays untouched.
    /// Returns the updated record, or None if the id is unknown.
    async fn apply_override(
        &self,
        id: Uuid,
        classification: ReplyClassification,
        overridden_by: &str,
        overridden_at: DateTime<Utc>,
    ) -> Result<Option<ClassificationRecord>, StoreError>;
}

/// Versioned scoring configuration rows
#[async_trait]
pub trait ScoringConfigStore: Send + Sync {
    /// Append a new row; rows are never updated in place
    async fn create(&self, record: ScoringConfigRecord) -> Result<(), StoreError>;

    /// Most recently created row, if any
    async fn latest(&self) -> Result<Option<ScoringConfigRecord>, StoreError>;
}
