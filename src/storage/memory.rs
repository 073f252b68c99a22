//! In-memory storage, for tests and embedding.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;
use crate::path::progress::NodeProgress;
use crate::srs::MemoryMap;
use crate::storage::{ProgressStore, StateStore};

/// In-memory memory-state storage backed by a `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    decks: RwLock<HashMap<String, MemoryMap>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self, deck_id: &str) -> Result<MemoryMap> {
        let decks = self.decks.read().unwrap();
        Ok(decks.get(deck_id).cloned().unwrap_or_default())
    }

    fn save(&self, deck_id: &str, map: &MemoryMap) -> Result<()> {
        let mut decks = self.decks.write().unwrap();
        decks.insert(deck_id.to_string(), map.clone());
        Ok(())
    }

    fn clear(&self, deck_id: &str) -> Result<()> {
        let mut decks = self.decks.write().unwrap();
        decks.remove(deck_id);
        Ok(())
    }
}

/// In-memory node-progress storage.
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    nodes: RwLock<HashMap<String, NodeProgress>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for InMemoryProgressStore {
    fn get(&self, node_id: &str) -> Result<Option<NodeProgress>> {
        let nodes = self.nodes.read().unwrap();
        Ok(nodes.get(node_id).cloned().map(|mut progress| {
            progress.normalize();
            progress
        }))
    }

    fn put(&self, node_id: &str, progress: &NodeProgress) -> Result<()> {
        let mut nodes = self.nodes.write().unwrap();
        nodes.insert(node_id.to_string(), progress.clone());
        Ok(())
    }

    fn delete(&self, node_id: &str) -> Result<()> {
        let mut nodes = self.nodes.write().unwrap();
        nodes.remove(node_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::{test_progress_store_crud, test_state_store_crud};

    #[test]
    fn test_in_memory_state_store_crud() {
        let store = InMemoryStateStore::new();
        test_state_store_crud(&store);
    }

    #[test]
    fn test_in_memory_progress_store_crud() {
        let store = InMemoryProgressStore::new();
        test_progress_store_crud(&store);
    }
}
