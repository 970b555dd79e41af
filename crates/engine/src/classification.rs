//! Reply classification service
//!
//! Wraps a classifier with persistence and audit logging. Classification
//! itself never fails; this layer can still fail on unknown leads or
//! store errors.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use leadflow_classifier::ReplyClassifier;
use leadflow_core::{
    ActivityEntry, ActivityType, AuditSink, ClassificationRecord, ClassificationStore, Error,
    LeadContext, LeadStore, ReplyClassification, Result,
};

pub struct ClassificationService {
    classifier: Arc<dyn ReplyClassifier>,
    classifications: Arc<dyn ClassificationStore>,
    leads: Arc<dyn LeadStore>,
    audit: Arc<dyn AuditSink>,
}

impl ClassificationService {
    pub fn new(
        classifier: Arc<dyn ReplyClassifier>,
        classifications: Arc<dyn ClassificationStore>,
        leads: Arc<dyn LeadStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            classifier,
            classifications,
            leads,
            audit,
        }
    }

    /// Classify an inbound reply and persist the result
    pub async fn classify_reply(
        &self,
        lead_id: Uuid,
        reply_body: &str,
        sender_email: Option<&str>,
    ) -> Result<ClassificationRecord> {
        let lead = self
            .leads
            .get(lead_id)
            .await?
            .ok_or(Error::LeadNotFound(lead_id))?;

        let context = LeadContext::from(&lead);
        let outcome = self.classifier.classify(reply_body, &context).await;

        let record = ClassificationRecord::new(lead_id, reply_body, &outcome);
        self.classifications.create(record.clone()).await?;

        self.log_activity(
            lead_id,
            ActivityType::ReplyClassified,
            json!({
                "classification": outcome.classification.as_str(),
                "confidence": outcome.confidence,
                "is_auto_reply": outcome.is_auto_reply,
                "sender_email": sender_email,
            }),
        )
        .await;

        info!(
            lead_id = %lead_id,
            classification = %outcome.classification,
            confidence = outcome.confidence,
            "Reply classified"
        );

        Ok(record)
    }

    /// Manually replace a classification, keeping the machine output
    pub async fn override_classification(
        &self,
        classification_id: Uuid,
        new_classification: ReplyClassification,
        overridden_by: &str,
    ) -> Result<ClassificationRecord> {
        let record = self
            .classifications
            .apply_override(
                classification_id,
                new_classification,
                overridden_by,
                Utc::now(),
            )
            .await?
            .ok_or(Error::ClassificationNotFound(classification_id))?;

        self.log_activity(
            record.lead_id,
            ActivityType::ClassificationOverridden,
            json!({
                "classification_id": classification_id,
                "original_classification": record.classification.as_str(),
                "new_classification": new_classification.as_str(),
                "overridden_by": overridden_by,
            }),
        )
        .await;

        info!(
            classification_id = %classification_id,
            new_classification = %new_classification,
            "Classification overridden"
        );

        Ok(record)
    }

    /// Most recent classification for a lead, if any
    pub async fn latest_classification(
        &self,
        lead_id: Uuid,
    ) -> Result<Option<ClassificationRecord>> {
        let mut all = self.classifications.for_lead(lead_id).await?;
        Ok(if all.is_empty() {
            None
        } else {
            Some(all.remove(0))
        })
    }

    /// All classifications for a lead, newest first
    pub async fn all_classifications(&self, lead_id: Uuid) -> Result<Vec<ClassificationRecord>> {
        Ok(self.classifications.for_lead(lead_id).await?)
    }

    /// Audit failures never fail the operation that produced them
    async fn log_activity(&self, lead_id: Uuid, activity: ActivityType, payload: serde_json::Value) {
        let entry = ActivityEntry::new(lead_id, activity, payload);
        if let Err(e) = self.audit.log_activity(entry).await {
            warn!(lead_id = %lead_id, error = %e, "Failed to log activity");
        }
    }
}
