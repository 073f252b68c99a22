//! CLI commands for Trellis.
//!
//! This module provides CLI commands for Trellis, organized into:
//! - **Review commands**: grade, due (the daily loop)
//! - **Curriculum commands**: mark, status, path (progress and gates)
//!
//! Each command is a struct generic over its storage traits, with an
//! options struct, a serializable output struct, and a `format_output`
//! helper that renders quiet/JSON/human text.

// Review commands
pub mod due;
pub mod grade;

// Curriculum commands
pub mod mark;
pub mod path_cmd;
pub mod status_cmd;

pub use due::DueCommand;
pub use grade::GradeCommand;
pub use mark::MarkCommand;
pub use path_cmd::PathCommand;
pub use status_cmd::StatusCommand;
