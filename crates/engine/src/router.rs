//! Reply routing and transition orchestration
//!
//! Sits in front of the transition engine. Inbound replies are classified
//! and routed through a fixed table of automatic transitions; manual
//! transitions get audit logging and feedback wiring. Calendar,
//! notification and audit failures are logged and swallowed so a flaky
//! collaborator cannot lose a reply.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use leadflow_core::classification::truncate_chars;
use leadflow_core::{
    ActivityEntry, ActivityType, AuditSink, CalendarProvider, ClassificationRecord, Error, Lead,
    LeadOutcome, LeadStore, NotificationSink, OutcomeStage, ReplyClassification, Result,
    StageHistoryRecord, TransitionReason,
};

use crate::classification::ClassificationService;
use crate::transition::StageTransitionEngine;
use crate::tuner::WeightTuner;

/// Reply characters kept for previews and notifications
const REPLY_PREVIEW_CHARS: usize = 500;

/// Preview characters embedded in transition notes
const NOTES_PREVIEW_CHARS: usize = 100;

/// Identity stamped on automatic reply-driven transitions
const REPLY_AGENT: &str = "reply_agent";

/// Outcome of routing one inbound reply
#[derive(Debug, Clone)]
pub struct RoutedReply {
    /// The transition executed by routing, if any
    pub stage_record: Option<StageHistoryRecord>,
    pub classification: ClassificationRecord,
    /// Human-readable description of the automatic action taken
    pub auto_action: Option<String>,
}

pub struct ReplyRouter {
    engine: Arc<StageTransitionEngine>,
    classification: Arc<ClassificationService>,
    tuner: Arc<WeightTuner>,
    leads: Arc<dyn LeadStore>,
    calendar: Arc<dyn CalendarProvider>,
    notifications: Arc<dyn NotificationSink>,
    audit: Arc<dyn AuditSink>,
}

impl ReplyRouter {
    pub fn new(
        engine: Arc<StageTransitionEngine>,
        classification: Arc<ClassificationService>,
        tuner: Arc<WeightTuner>,
        leads: Arc<dyn LeadStore>,
        calendar: Arc<dyn CalendarProvider>,
        notifications: Arc<dyn NotificationSink>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            engine,
            classification,
            tuner,
            leads,
            calendar,
            notifications,
            audit,
        }
    }

    async fn require_lead(&self, lead_id: Uuid) -> Result<Lead> {
        self.leads
            .get(lead_id)
            .await?
            .ok_or(Error::LeadNotFound(lead_id))
    }

    /// Classify an inbound reply and route it
    ///
    /// Always classifies and records EMAIL_REPLIED, even when the lead's
    /// stage permits no automatic transition.
    pub async fn handle_inbound_reply(
        &self,
        lead_id: Uuid,
        reply_body: &str,
        sender_email: Option<&str>,
    ) -> Result<RoutedReply> {
        let lead = self.require_lead(lead_id).await?;
        let current = lead.current_outcome_stage;
        let preview = truncate_chars(reply_body, REPLY_PREVIEW_CHARS);
        let notes_preview = truncate_chars(&preview, NOTES_PREVIEW_CHARS);

        self.log_activity(
            lead_id,
            ActivityType::EmailReplied,
            json!({
                "reply_body": preview,
                "sender_email": sender_email,
            }),
        )
        .await;

        let record = self
            .classification
            .classify_reply(lead_id, reply_body, sender_email)
            .await?;

        // EMAIL_SENT and NO_RESPONSE accept any reply-driven transition;
        // RESPONDED additionally accepts the terminal ones below
        let can_auto = matches!(
            current,
            Some(OutcomeStage::EmailSent) | Some(OutcomeStage::NoResponse)
        );
        let can_close = can_auto || current == Some(OutcomeStage::Responded);

        let mut stage_record = None;
        let mut auto_action = None;

        match record.classification {
            ReplyClassification::OutOfOffice => {
                auto_action = Some("No stage transition (out-of-office detected)".to_string());
                self.notify_classified(&lead, &record).await;
            }

            ReplyClassification::Unsubscribe => {
                if can_close {
                    let transitioned = self
                        .auto_transition(
                            lead_id,
                            OutcomeStage::Disqualified,
                            format!("Unsubscribe request: {}", notes_preview),
                            current,
                        )
                        .await?;
                    stage_record = Some(transitioned);
                    auto_action = Some("Auto-transitioned to Disqualified".to_string());
                }
                self.notify_classified(&lead, &record).await;
            }

            ReplyClassification::NotInterested => {
                if can_close {
                    let transitioned = self
                        .auto_transition(
                            lead_id,
                            OutcomeStage::ClosedLost,
                            format!("Not interested: {}", notes_preview),
                            current,
                        )
                        .await?;
                    stage_record = Some(transitioned);
                    auto_action = Some("Auto-transitioned to Closed Lost".to_string());
                }
                self.notify_classified(&lead, &record).await;
            }

            ReplyClassification::InterestedBookDemo => {
                if can_auto {
                    let transitioned = self
                        .auto_transition(
                            lead_id,
                            OutcomeStage::Responded,
                            format!("Interested reply: {}", notes_preview),
                            current,
                        )
                        .await?;
                    stage_record = Some(transitioned);
                }

                let scheduling_link = match self.calendar.scheduling_link(&lead).await {
                    Ok(link) => Some(link),
                    Err(e) => {
                        warn!(lead_id = %lead_id, error = %e, "Failed to get scheduling link");
                        None
                    }
                };
                auto_action =
                    Some("Transitioned to Responded, scheduling link generated".to_string());

                if let Err(e) = self
                    .notifications
                    .notify_demo_requested(
                        &lead,
                        scheduling_link.as_deref(),
                        &record.extracted_dates,
                    )
                    .await
                {
                    warn!(lead_id = %lead_id, error = %e, "Failed to send demo notification");
                }
            }

            ReplyClassification::Question => {
                if can_auto {
                    let transitioned = self
                        .auto_transition(
                            lead_id,
                            OutcomeStage::Responded,
                            format!("Question reply: {}", notes_preview),
                            current,
                        )
                        .await?;
                    stage_record = Some(transitioned);
                    auto_action =
                        Some("Transitioned to Responded (question received)".to_string());
                }
                self.notify_classified(&lead, &record).await;
            }

            ReplyClassification::Unclear => {
                if can_auto {
                    let transitioned = self
                        .auto_transition(
                            lead_id,
                            OutcomeStage::Responded,
                            format!("Unclear reply: {}", notes_preview),
                            current,
                        )
                        .await?;
                    stage_record = Some(transitioned);
                    auto_action = Some("Transitioned to Responded (needs review)".to_string());
                }
                self.notify_classified(&lead, &record).await;
            }
        }

        if let Some(ref transitioned) = stage_record {
            self.maybe_update_weights(&lead, transitioned.stage, false)
                .await?;
        }

        info!(
            lead_id = %lead_id,
            classification = %record.classification,
            auto_action = auto_action.as_deref().unwrap_or("none"),
            "Inbound reply processed"
        );

        Ok(RoutedReply {
            stage_record,
            classification: record,
            auto_action,
        })
    }

    /// Manual stage transition with audit logging and feedback wiring
    pub async fn transition_stage(
        &self,
        lead_id: Uuid,
        new_stage: OutcomeStage,
        notes: Option<String>,
        triggered_by: &str,
    ) -> Result<StageHistoryRecord> {
        let lead = self.require_lead(lead_id).await?;
        let from = lead.current_outcome_stage;

        let record = self
            .engine
            .transition(
                lead_id,
                new_stage,
                TransitionReason::Manual,
                triggered_by,
                notes,
                None,
            )
            .await?;

        self.log_status_changed(lead_id, from, new_stage, triggered_by, None)
            .await;

        self.maybe_update_weights(&lead, new_stage, true).await?;

        Ok(record)
    }

    /// Set the initial EMAIL_SENT stage after an email goes out
    pub async fn handle_email_sent(&self, lead_id: Uuid) -> Result<StageHistoryRecord> {
        self.engine.initialize_stage(lead_id).await
    }

    /// Sweep stale EMAIL_SENT leads into NO_RESPONSE, with audit entries
    pub async fn run_stale_sweep(&self, stale_after_days: i64) -> Result<Vec<StageHistoryRecord>> {
        let records = self.engine.stale_sweep(stale_after_days).await?;
        for record in &records {
            self.log_status_changed(
                record.lead_id,
                record.previous_stage,
                record.stage,
                "system",
                Some(format!("auto_no_response_{}d", stale_after_days)),
            )
            .await;
        }
        Ok(records)
    }

    async fn auto_transition(
        &self,
        lead_id: Uuid,
        new_stage: OutcomeStage,
        notes: String,
        from: Option<OutcomeStage>,
    ) -> Result<StageHistoryRecord> {
        let record = self
            .engine
            .transition(
                lead_id,
                new_stage,
                TransitionReason::Automatic,
                REPLY_AGENT,
                Some(notes),
                None,
            )
            .await?;
        self.log_status_changed(lead_id, from, new_stage, REPLY_AGENT, None)
            .await;
        Ok(record)
    }

    /// Feed a closing stage back into the weight tuner
    ///
    /// Feedback failure aborts a manual transition's caller but never a
    /// reply, which has already been classified and recorded.
    async fn maybe_update_weights(
        &self,
        lead: &Lead,
        new_stage: OutcomeStage,
        propagate: bool,
    ) -> Result<()> {
        if !new_stage.triggers_feedback() {
            return Ok(());
        }
        let (Some(score), Some(outcome)) = (lead.score_value, LeadOutcome::from_stage(new_stage))
        else {
            return Ok(());
        };

        match self.tuner.update_from_feedback(outcome, score).await {
            Ok(_) => {
                info!(
                    lead_id = %lead.id,
                    stage = %new_stage,
                    "Learning weights updated from stage transition"
                );
                Ok(())
            }
            Err(e) if !propagate => {
                warn!(lead_id = %lead.id, error = %e, "Weight update failed after reply routing");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn notify_classified(&self, lead: &Lead, record: &ClassificationRecord) {
        if let Err(e) = self.notifications.notify_reply_classified(lead, record).await {
            warn!(lead_id = %lead.id, error = %e, "Failed to send classification notification");
        }
    }

    async fn log_status_changed(
        &self,
        lead_id: Uuid,
        from: Option<OutcomeStage>,
        to: OutcomeStage,
        triggered_by: &str,
        reason: Option<String>,
    ) {
        let mut payload = json!({
            "outcome_stage_from": from.map(|s| s.as_str()),
            "outcome_stage_to": to.as_str(),
            "triggered_by": triggered_by,
        });
        if let (Some(obj), Some(reason)) = (payload.as_object_mut(), reason) {
            obj.insert("reason".to_string(), json!(reason));
        }
        self.log_activity(lead_id, ActivityType::StatusChanged, payload)
            .await;
    }

    async fn log_activity(&self, lead_id: Uuid, activity: ActivityType, payload: serde_json::Value) {
        let entry = ActivityEntry::new(lead_id, activity, payload);
        if let Err(e) = self.audit.log_activity(entry).await {
            warn!(lead_id = %lead_id, error = %e, "Failed to log activity");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_classifier::RuleBasedClassifier;
    use leadflow_config::ScoringDefaults;
    use leadflow_store::{
        InMemoryAuditSink, InMemoryClassificationStore, InMemoryHistoryStore, InMemoryLeadStore,
        InMemoryScoringConfigStore, RecordingNotificationSink, StaticCalendarProvider,
    };

    struct Fixture {
        router: ReplyRouter,
        leads: Arc<InMemoryLeadStore>,
        notifications: Arc<RecordingNotificationSink>,
        audit: Arc<InMemoryAuditSink>,
        configs: Arc<InMemoryScoringConfigStore>,
    }

    fn fixture() -> Fixture {
        let leads = Arc::new(InMemoryLeadStore::new());
        let history = Arc::new(InMemoryHistoryStore::new());
        let audit = Arc::new(InMemoryAuditSink::new());
        let notifications = Arc::new(RecordingNotificationSink::new());
        let configs = Arc::new(InMemoryScoringConfigStore::new());

        let engine = Arc::new(StageTransitionEngine::new(leads.clone(), history));
        let classification = Arc::new(ClassificationService::new(
            Arc::new(RuleBasedClassifier),
            Arc::new(InMemoryClassificationStore::new()),
            leads.clone(),
            audit.clone(),
        ));
        let tuner = Arc::new(WeightTuner::new(configs.clone(), ScoringDefaults::default()));

        let router = ReplyRouter::new(
            engine,
            classification,
            tuner,
            leads.clone(),
            Arc::new(StaticCalendarProvider::new("https://calendly.com/acme/demo")),
            notifications.clone(),
            audit.clone(),
        );

        Fixture {
            router,
            leads,
            notifications,
            audit,
            configs,
        }
    }

    fn seed(fx: &Fixture, score: Option<i32>, stage: Option<OutcomeStage>) -> Uuid {
        fx.leads.seed("Rosa", "Klein", "Northwind", Some("Retail"), score, stage)
    }

    #[tokio::test]
    async fn test_out_of_office_leaves_stage_alone() {
        let fx = fixture();
        let lead_id = seed(&fx, Some(50), Some(OutcomeStage::EmailSent));

        let routed = fx
            .router
            .handle_inbound_reply(lead_id, "I'm out of office until Friday", None)
            .await
            .unwrap();

        assert!(routed.stage_record.is_none());
        assert_eq!(
            routed.classification.classification,
            ReplyClassification::OutOfOffice
        );
        assert_eq!(fx.notifications.classified_count(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_from_responded_disqualifies() {
        let fx = fixture();
        let lead_id = seed(&fx, Some(30), Some(OutcomeStage::Responded));

        let routed = fx
            .router
            .handle_inbound_reply(lead_id, "Please remove me from your list", None)
            .await
            .unwrap();

        let record = routed.stage_record.unwrap();
        assert_eq!(record.stage, OutcomeStage::Disqualified);
        assert_eq!(record.triggered_by, "reply_agent");
        assert!(record.notes.unwrap().starts_with("Unsubscribe request:"));
    }

    #[tokio::test]
    async fn test_interested_from_booked_demo_keeps_stage() {
        // Already past RESPONDED: no transition, but the rep still gets
        // the scheduling link notification
        let fx = fixture();
        let lead_id = seed(&fx, Some(80), Some(OutcomeStage::BookedDemo));

        let routed = fx
            .router
            .handle_inbound_reply(lead_id, "Sounds great, let's set up a call", None)
            .await
            .unwrap();

        assert!(routed.stage_record.is_none());
        assert_eq!(fx.notifications.demo_requested_count(), 1);
        assert_eq!(
            fx.notifications.last_scheduling_link(),
            Some("https://calendly.com/acme/demo".to_string())
        );
    }

    #[tokio::test]
    async fn test_reply_audit_order() {
        let fx = fixture();
        let lead_id = seed(&fx, Some(50), Some(OutcomeStage::EmailSent));

        fx.router
            .handle_inbound_reply(lead_id, "How does it work?", Some("rosa@northwind.example"))
            .await
            .unwrap();

        let entries = fx.audit.activities(lead_id).await.unwrap();
        // Newest first: STATUS_CHANGED, REPLY_CLASSIFIED, EMAIL_REPLIED
        let kinds: Vec<ActivityType> = entries.iter().map(|e| e.activity).collect();
        assert_eq!(
            kinds,
            vec![
                ActivityType::StatusChanged,
                ActivityType::ReplyClassified,
                ActivityType::EmailReplied,
            ]
        );
    }

    #[tokio::test]
    async fn test_manual_terminal_transition_triggers_feedback() {
        let fx = fixture();
        let lead_id = seed(&fx, Some(85), Some(OutcomeStage::Responded));

        fx.router
            .transition_stage(lead_id, OutcomeStage::ClosedLost, None, "user")
            .await
            .unwrap();

        // Negative outcome with hot score: a new learning row appears
        assert_eq!(fx.configs.row_count(), 2);
    }

    #[tokio::test]
    async fn test_manual_transition_without_score_skips_feedback() {
        let fx = fixture();
        let lead_id = seed(&fx, None, Some(OutcomeStage::Responded));

        fx.router
            .transition_stage(lead_id, OutcomeStage::ClosedLost, None, "user")
            .await
            .unwrap();

        assert_eq!(fx.configs.row_count(), 0);
    }

    #[tokio::test]
    async fn test_automatic_terminal_transition_triggers_feedback() {
        let fx = fixture();
        let lead_id = seed(&fx, Some(90), Some(OutcomeStage::EmailSent));

        fx.router
            .handle_inbound_reply(lead_id, "Not interested, thanks", None)
            .await
            .unwrap();

        // CLOSED_LOST via routing on a hot-scored lead also feeds the tuner
        assert_eq!(fx.configs.row_count(), 2);
    }
}
