//! Persistence for learner state.
//!
//! Stores are injected dependencies behind the [`StateStore`] and
//! [`ProgressStore`] traits; the pure scheduler and gate engine never touch
//! storage themselves. File-backed implementations serve the CLI, in-memory
//! ones serve tests.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::{FileProgressStore, FileStateStore};
pub use memory::{InMemoryProgressStore, InMemoryStateStore};
pub use traits::{ProgressStore, StateStore};
