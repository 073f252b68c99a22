//! Trellis - Spaced-Repetition Curriculum Engine
//!
//! Trellis schedules vocabulary reviews with an SM-2-derived scheduler and
//! gates a linked curriculum of nodes behind deck coverage and step scores.
//! Learner state is stored as plain JSON in the user's home directory.

pub mod cli;
pub mod config;
pub mod deck;
pub mod error;
pub mod path;
pub mod srs;
pub mod storage;

pub use config::Config;
pub use deck::{DeckManifest, DeckProvider, FileDeckProvider};
pub use error::{FailOpen, Result, TrellisError};
pub use path::{
    compute_status, coverage, Coverage, NodeProgress, NodeStatus, PathDoc, PathNode, StepKind,
    StepLocks,
};
pub use srs::{schedule, Grade, LeechPolicy, MemoryMap, MemoryState};
pub use storage::{
    FileProgressStore, FileStateStore, InMemoryProgressStore, InMemoryStateStore, ProgressStore,
    StateStore,
};

// CLI commands
pub use cli::{DueCommand, GradeCommand, MarkCommand, PathCommand, StatusCommand};
