//! Lead outcome lifecycle engine
//!
//! Orchestrates the post-outreach lifecycle of a sales lead:
//! - `StageTransitionEngine`: validated stage transitions over an
//!   append-only history, serialized per lead
//! - `ClassificationService`: classify inbound replies and persist the
//!   results, with manual override support
//! - `ReplyRouter`: route classified replies into automatic transitions
//!   and side effects, and front manual transitions with audit logging
//! - `WeightTuner`: nudge scoring weights from closed outcomes

pub mod classification;
pub mod router;
pub mod transition;
pub mod tuner;

pub use classification::ClassificationService;
pub use router::{ReplyRouter, RoutedReply};
pub use transition::StageTransitionEngine;
pub use tuner::WeightTuner;
