//! Curriculum path: document model, per-node progress, and the gate engine.
//!
//! A path is an ordered chain of nodes, each tied to a deck and a set of
//! gate thresholds. [`status::compute_status`] turns declared thresholds,
//! memory states, and step-attempt history into a derived [`NodeStatus`]:
//! which gates are met, which steps are locked, and where to resume.

pub mod document;
pub mod progress;
pub mod status;

pub use document::{GateThresholds, PathDoc, PathNode};
pub use progress::{NodeProgress, StepAttempt, StepKind, StepProgress, HISTORY_LIMIT};
pub use status::{
    compute_status, coverage, Coverage, GatedStepSummary, NodeStatus, StepLocks, StepSummary,
};
