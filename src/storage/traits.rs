//! Storage traits for learner state.

use std::sync::Arc;

use crate::error::Result;
use crate::path::progress::NodeProgress;
use crate::srs::MemoryMap;

/// Per-deck memory-state storage.
///
/// Implementations persist the card-id → memory-state map for each deck.
/// A deck with no stored state loads as an empty map.
pub trait StateStore: Send + Sync {
    /// Load the memory-state map for a deck.
    fn load(&self, deck_id: &str) -> Result<MemoryMap>;

    /// Save the memory-state map for a deck, replacing any previous map.
    fn save(&self, deck_id: &str, map: &MemoryMap) -> Result<()>;

    /// Remove all stored state for a deck.
    ///
    /// Returns `Ok(())` even if the deck has no stored state.
    fn clear(&self, deck_id: &str) -> Result<()>;
}

/// Per-node progress storage.
///
/// Implementations must hand back normalized records: legacy shapes are
/// upgraded on read, never surfaced to callers.
pub trait ProgressStore: Send + Sync {
    /// Retrieve progress for a node.
    ///
    /// Returns `Ok(None)` if the node has never been touched.
    fn get(&self, node_id: &str) -> Result<Option<NodeProgress>>;

    /// Save progress for a node, creating or replacing the record.
    fn put(&self, node_id: &str, progress: &NodeProgress) -> Result<()>;

    /// Delete progress for a node.
    ///
    /// Returns `Ok(())` even if no record exists.
    fn delete(&self, node_id: &str) -> Result<()>;
}

impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    fn load(&self, deck_id: &str) -> Result<MemoryMap> {
        (**self).load(deck_id)
    }

    fn save(&self, deck_id: &str, map: &MemoryMap) -> Result<()> {
        (**self).save(deck_id, map)
    }

    fn clear(&self, deck_id: &str) -> Result<()> {
        (**self).clear(deck_id)
    }
}

impl<T: ProgressStore + ?Sized> ProgressStore for Arc<T> {
    fn get(&self, node_id: &str) -> Result<Option<NodeProgress>> {
        (**self).get(node_id)
    }

    fn put(&self, node_id: &str, progress: &NodeProgress) -> Result<()> {
        (**self).put(node_id, progress)
    }

    fn delete(&self, node_id: &str) -> Result<()> {
        (**self).delete(node_id)
    }
}

/// Shared conformance checks for store implementations.
#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::path::progress::StepKind;
    use crate::srs::{schedule, Grade, MemoryState};
    use chrono::Utc;

    /// Exercise the StateStore contract against an implementation.
    pub fn test_state_store_crud<S: StateStore>(store: &S) {
        let now = Utc::now();

        // An unknown deck loads as an empty map.
        assert!(store.load("band-a-1").unwrap().is_empty());

        // Save a map with one graded card.
        let mut map = MemoryMap::new();
        map.insert(
            "ni-hao".to_string(),
            schedule(&MemoryState::initial(now), Grade::Good, now),
        );
        store.save("band-a-1", &map).unwrap();

        let loaded = store.load("band-a-1").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["ni-hao"].repetitions, 1);

        // Decks are isolated from each other.
        assert!(store.load("band-a-2").unwrap().is_empty());

        // Replacing the map drops absent cards.
        store.save("band-a-1", &MemoryMap::new()).unwrap();
        assert!(store.load("band-a-1").unwrap().is_empty());

        // Clear is idempotent.
        store.save("band-a-1", &map).unwrap();
        store.clear("band-a-1").unwrap();
        assert!(store.load("band-a-1").unwrap().is_empty());
        store.clear("band-a-1").unwrap();
    }

    /// Exercise the ProgressStore contract against an implementation.
    pub fn test_progress_store_crud<S: ProgressStore>(store: &S) {
        let now = Utc::now();

        assert!(store.get("intro").unwrap().is_none());

        let mut progress = NodeProgress::default();
        progress.mark_step(StepKind::Quiz, Some(8), Some(10), now);
        store.put("intro", &progress).unwrap();

        let loaded = store.get("intro").unwrap().unwrap();
        assert_eq!(loaded.step(StepKind::Quiz).unwrap().attempts, 1);
        assert!(loaded.started_at.is_some());

        // Nodes are isolated.
        assert!(store.get("food").unwrap().is_none());

        store.delete("intro").unwrap();
        assert!(store.get("intro").unwrap().is_none());

        // Delete again should succeed.
        store.delete("intro").unwrap();
    }
}
