//! Collaborator traits implemented by storage and side-effect adapters

mod collaborators;
mod stores;

pub use collaborators::{AuditSink, CalendarProvider, CollaboratorError, NotificationSink};
pub use stores::{ClassificationStore, LeadStore, ScoringConfigStore, StageHistoryStore};
