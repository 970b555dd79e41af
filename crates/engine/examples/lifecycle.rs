//! Walk a lead through the outcome lifecycle with in-memory stores.
//!
//! Run with: cargo run -p leadflow-engine --example lifecycle

use std::sync::Arc;

use leadflow_classifier::RuleBasedClassifier;
use leadflow_config::ScoringDefaults;
use leadflow_core::OutcomeStage;
use leadflow_engine::{ClassificationService, ReplyRouter, StageTransitionEngine, WeightTuner};
use leadflow_store::{
    InMemoryAuditSink, InMemoryClassificationStore, InMemoryHistoryStore, InMemoryLeadStore,
    InMemoryScoringConfigStore, RecordingNotificationSink, StaticCalendarProvider,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let leads = Arc::new(InMemoryLeadStore::new());
    let history = Arc::new(InMemoryHistoryStore::new());
    let audit = Arc::new(InMemoryAuditSink::new());

    let engine = Arc::new(StageTransitionEngine::new(leads.clone(), history));
    let classification = Arc::new(ClassificationService::new(
        Arc::new(RuleBasedClassifier),
        Arc::new(InMemoryClassificationStore::new()),
        leads.clone(),
        audit.clone(),
    ));
    let tuner = Arc::new(WeightTuner::new(
        Arc::new(InMemoryScoringConfigStore::new()),
        ScoringDefaults::default(),
    ));
    let router = ReplyRouter::new(
        engine.clone(),
        classification,
        tuner,
        leads.clone(),
        Arc::new(StaticCalendarProvider::new("https://calendly.com/acme/demo")),
        Arc::new(RecordingNotificationSink::new()),
        audit,
    );

    let lead_id = leads.seed("Iris", "Vang", "Initech", Some("Fintech"), Some(35), None);

    router.handle_email_sent(lead_id).await?;
    let routed = router
        .handle_inbound_reply(
            lead_id,
            "Sounds great, can we schedule a demo next Tuesday?",
            Some("iris@initech.example"),
        )
        .await?;
    println!(
        "classified as {} ({:.2}), action: {}",
        routed.classification.classification,
        routed.classification.confidence,
        routed.auto_action.as_deref().unwrap_or("none"),
    );

    router
        .transition_stage(lead_id, OutcomeStage::BookedDemo, None, "alice")
        .await?;
    router
        .transition_stage(lead_id, OutcomeStage::ClosedWon, Some("Signed".into()), "alice")
        .await?;

    for record in engine.history(lead_id).await? {
        println!(
            "{} -> {} ({}, by {})",
            record
                .previous_stage
                .map(|s| s.as_str())
                .unwrap_or("-"),
            record.stage,
            record.reason.as_str(),
            record.triggered_by,
        );
    }

    Ok(())
}
