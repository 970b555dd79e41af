//! Recording notification sink
//!
//! Renders notifications the way the sales team sees them and keeps them
//! in memory. Tests assert against the recorded payloads.

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use leadflow_core::classification::truncate_chars;
use leadflow_core::{ClassificationRecord, CollaboratorError, Lead, NotificationSink};

const BODY_PREVIEW_CHARS: usize = 200;

/// A rendered in-app notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub lead_id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub scheduling_link: Option<String>,
}

#[derive(Default)]
pub struct RecordingNotificationSink {
    sent: RwLock<Vec<Notification>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.sent.read().clone()
    }

    pub fn classified_count(&self) -> usize {
        self.sent
            .read()
            .iter()
            .filter(|n| n.kind == "reply_classified")
            .count()
    }

    pub fn demo_requested_count(&self) -> usize {
        self.sent
            .read()
            .iter()
            .filter(|n| n.kind == "demo_requested")
            .count()
    }

    pub fn last_scheduling_link(&self) -> Option<String> {
        self.sent
            .read()
            .iter()
            .rev()
            .find_map(|n| n.scheduling_link.clone())
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify_reply_classified(
        &self,
        lead: &Lead,
        record: &ClassificationRecord,
    ) -> Result<(), CollaboratorError> {
        let classification = record.effective_classification();
        self.sent.write().push(Notification {
            lead_id: lead.id,
            kind: "reply_classified".to_string(),
            title: format!("Reply classified: {}", classification),
            body: format!(
                "Lead {} replied. Classification: {}. Preview: {}",
                lead.full_name(),
                classification,
                truncate_chars(&record.reply_body, BODY_PREVIEW_CHARS),
            ),
            scheduling_link: None,
        });
        Ok(())
    }

    async fn notify_demo_requested(
        &self,
        lead: &Lead,
        scheduling_link: Option<&str>,
        extracted_dates: &[String],
    ) -> Result<(), CollaboratorError> {
        let mut body_parts = vec![format!("Lead {} wants to book a demo.", lead.full_name())];
        if !extracted_dates.is_empty() {
            body_parts.push(format!("Suggested dates: {}", extracted_dates.join(", ")));
        }
        if let Some(link) = scheduling_link {
            body_parts.push(format!("Scheduling link: {}", link));
        }

        self.sent.write().push(Notification {
            lead_id: lead.id,
            kind: "demo_requested".to_string(),
            title: format!("Demo requested by {}", lead.full_name()),
            body: body_parts.join(" "),
            scheduling_link: scheduling_link.map(str::to_string),
        });
        Ok(())
    }
}
