//! In-memory activity log

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use leadflow_core::{ActivityEntry, AuditSink, CollaboratorError};

#[derive(Default)]
pub struct InMemoryAuditSink {
    entries: RwLock<Vec<ActivityEntry>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn log_activity(&self, entry: ActivityEntry) -> Result<(), CollaboratorError> {
        self.entries.write().push(entry);
        Ok(())
    }

    async fn activities(&self, lead_id: Uuid) -> Result<Vec<ActivityEntry>, CollaboratorError> {
        // Reverse insertion order rather than sorting timestamps, so
        // entries created in the same instant stay deterministic
        Ok(self
            .entries
            .read()
            .iter()
            .rev()
            .filter(|e| e.lead_id == lead_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::ActivityType;
    use serde_json::json;

    #[tokio::test]
    async fn test_activities_newest_first() {
        let sink = InMemoryAuditSink::new();
        let lead_id = Uuid::new_v4();
        sink.log_activity(ActivityEntry::new(
            lead_id,
            ActivityType::EmailReplied,
            json!({}),
        ))
        .await
        .unwrap();
        sink.log_activity(ActivityEntry::new(
            lead_id,
            ActivityType::ReplyClassified,
            json!({}),
        ))
        .await
        .unwrap();

        let entries = sink.activities(lead_id).await.unwrap();
        assert_eq!(entries[0].activity, ActivityType::ReplyClassified);
        assert_eq!(entries[1].activity, ActivityType::EmailReplied);
    }
}
