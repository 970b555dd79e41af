//! Core types and traits for the lead outcome engine
//!
//! This crate provides the foundational pieces used across all other crates:
//! - Outcome stage enum with the transition adjacency table
//! - Lead aggregate, stage history, classification and scoring config records
//! - Error taxonomy (not-found, invalid transition, store failures)
//! - Collaborator traits for stores, calendar, notifications and audit

pub mod activity;
pub mod classification;
pub mod error;
pub mod lead;
pub mod scoring;
pub mod stage;
pub mod traits;

pub use activity::{ActivityEntry, ActivityType};
pub use classification::{
    ClassificationOutcome, ClassificationRecord, ReplyClassification, MAX_REPLY_CHARS,
};
pub use error::{Error, Result, StoreError};
pub use lead::{Lead, LeadContext, LeadOutcome};
pub use scoring::{ScoreThresholds, ScoringConfigRecord, ThresholdPatch, MIN_WEIGHT};
pub use stage::{OutcomeStage, StageHistoryRecord, TransitionReason};

pub use traits::{
    AuditSink, CalendarProvider, ClassificationStore, CollaboratorError, LeadStore,
    NotificationSink, ScoringConfigStore, StageHistoryStore,
};
