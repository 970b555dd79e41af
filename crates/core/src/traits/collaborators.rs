//! Side-effect collaborators
//!
//! Calendar, notification and audit failures must never abort a stage
//! transition, so these traits return their own error type. Callers log
//! the failure and carry on.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::activity::ActivityEntry;
use crate::classification::ClassificationRecord;
use crate::lead::Lead;

/// Failure in a best-effort collaborator
#[derive(Debug, Clone, Error)]
#[error("Collaborator error: {0}")]
pub struct CollaboratorError(pub String);

/// Source of scheduling links handed to interested leads
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn scheduling_link(&self, lead: &Lead) -> Result<String, CollaboratorError>;
}

/// Outbound notifications to the sales team
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify_reply_classified(
        &self,
        lead: &Lead,
        record: &ClassificationRecord,
    ) -> Result<(), CollaboratorError>;

    async fn notify_demo_requested(
        &self,
        lead: &Lead,
        scheduling_link: Option<&str>,
        extracted_dates: &[String],
    ) -> Result<(), CollaboratorError>;
}

/// Append-only activity log
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log_activity(&self, entry: ActivityEntry) -> Result<(), CollaboratorError>;

    /// Activity entries for a lead, newest first
    async fn activities(&self, lead_id: Uuid) -> Result<Vec<ActivityEntry>, CollaboratorError>;
}
