//! Spaced-repetition scheduling for Trellis.
//!
//! The scheduler is a pure SM-2-derived transition function over per-card
//! [`MemoryState`] records; leech detection is a separate observer policy
//! layered on top of it.

pub mod leech;
pub mod scheduler;

pub use leech::{LeechPolicy, DEFAULT_LEECH_THRESHOLD};
pub use scheduler::{schedule, Grade, MemoryMap, MemoryState, MAX_EASE, MIN_EASE};
