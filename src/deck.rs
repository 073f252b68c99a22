//! Deck manifests and the deck provider boundary.
//!
//! The gate engine only ever needs a deck's ordered card-id list; card
//! content (prompts, audio, script variants) lives outside this crate.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrellisError};

/// A deck's identity and ordered card ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckManifest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub cards: Vec<String>,
}

impl DeckManifest {
    /// Reject manifests with empty or duplicate card ids.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(TrellisError::content("deck has an empty id"));
        }
        for (i, card) in self.cards.iter().enumerate() {
            if card.is_empty() {
                return Err(TrellisError::content(format!(
                    "deck {}: card at index {} has an empty id",
                    self.id, i
                )));
            }
            if self.cards.iter().filter(|c| *c == card).count() > 1 {
                return Err(TrellisError::content(format!(
                    "deck {}: duplicate card id: {}",
                    self.id, card
                )));
            }
        }
        Ok(())
    }
}

/// Supplies deck manifests by id.
pub trait DeckProvider: Send + Sync {
    fn deck(&self, deck_id: &str) -> Result<DeckManifest>;
}

impl<T: DeckProvider + ?Sized> DeckProvider for Arc<T> {
    fn deck(&self, deck_id: &str) -> Result<DeckManifest> {
        (**self).deck(deck_id)
    }
}

/// Reads deck manifests from `<decks_dir>/<deck-id>.json`.
#[derive(Debug, Clone)]
pub struct FileDeckProvider {
    decks_dir: PathBuf,
}

impl FileDeckProvider {
    pub fn new(decks_dir: impl Into<PathBuf>) -> Self {
        Self {
            decks_dir: decks_dir.into(),
        }
    }
}

impl DeckProvider for FileDeckProvider {
    fn deck(&self, deck_id: &str) -> Result<DeckManifest> {
        // Deck ids are file stems; anything path-like is rejected outright.
        if deck_id.is_empty() || deck_id.contains(['/', '\\', '.']) {
            return Err(TrellisError::deck_not_found(deck_id));
        }

        let path = self.decks_dir.join(format!("{}.json", deck_id));
        if !path.exists() {
            return Err(TrellisError::deck_not_found(deck_id));
        }

        let content = fs::read_to_string(&path).map_err(|e| TrellisError::storage(&path, e))?;
        let manifest: DeckManifest = serde_json::from_str(&content)?;
        manifest.validate()?;
        Ok(manifest)
    }
}

// =============================================================================
// Tests
// =============================================================================
