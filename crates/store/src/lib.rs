//! In-memory implementations of the engine's collaborator traits
//!
//! Backs single-process deployments and every test in the workspace. Each
//! store guards its data with a parking_lot RwLock; cross-record atomicity
//! comes from the engine's per-lead locking, not from here.

pub mod audit;
pub mod calendar;
pub mod classifications;
pub mod history;
pub mod leads;
pub mod notify;
pub mod scoring;

pub use audit::InMemoryAuditSink;
pub use calendar::StaticCalendarProvider;
pub use classifications::InMemoryClassificationStore;
pub use history::InMemoryHistoryStore;
pub use leads::InMemoryLeadStore;
pub use notify::{Notification, RecordingNotificationSink};
pub use scoring::InMemoryScoringConfigStore;
