//! Activity log types consumed by the audit sink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of activity recorded against a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    EmailReplied,
    ReplyClassified,
    StatusChanged,
    ClassificationOverridden,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailReplied => "EMAIL_REPLIED",
            Self::ReplyClassified => "REPLY_CLASSIFIED",
            Self::StatusChanged => "STATUS_CHANGED",
            Self::ClassificationOverridden => "CLASSIFICATION_OVERRIDDEN",
        }
    }
}

/// One audit entry; payload shape varies per activity type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub activity: ActivityType,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(lead_id: Uuid, activity: ActivityType, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_id,
            activity,
            payload,
            created_at: Utc::now(),
        }
    }
}
