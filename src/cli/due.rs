//! Due command for Trellis.
//!
//! Reports the review queue for a deck: which cards are due now, which have
//! never been seen, and how many are in the scheduler at all.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::deck::DeckProvider;
use crate::storage::StateStore;

/// Options for the due command.
#[derive(Debug, Clone, Default)]
pub struct DueOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the due command.
#[derive(Debug, Clone, Serialize)]
pub struct DueOutput {
    pub success: bool,
    pub deck: String,
    /// Cards in the deck manifest.
    pub total: usize,
    /// Scheduled cards whose due time has been reached.
    pub due: usize,
    /// Cards with no review record yet.
    pub new: usize,
    /// Cards graded at least once.
    pub studied: usize,
    /// Due card ids, in manifest order.
    #[serde(rename = "dueCards")]
    pub due_cards: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DueOutput {
    fn failure(deck: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            deck: deck.to_string(),
            total: 0,
            due: 0,
            new: 0,
            studied: 0,
            due_cards: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The due command implementation.
pub struct DueCommand<S: StateStore, D: DeckProvider> {
    states: S,
    decks: D,
}

impl<S: StateStore, D: DeckProvider> DueCommand<S, D> {
    /// Create a new due command.
    pub fn new(states: S, decks: D) -> Self {
        Self { states, decks }
    }

    /// Compute the review queue for `deck_id` at instant `now`.
    pub fn run(&self, deck_id: &str, now: DateTime<Utc>, _options: &DueOptions) -> DueOutput {
        let manifest = match self.decks.deck(deck_id) {
            Ok(manifest) => manifest,
            Err(e) => return DueOutput::failure(deck_id, e.to_string()),
        };
        let states = match self.states.load(deck_id) {
            Ok(states) => states,
            Err(e) => return DueOutput::failure(deck_id, e.to_string()),
        };

        let mut due_cards = Vec::new();
        let mut new = 0;
        let mut studied = 0;
        for card in &manifest.cards {
            match states.get(card) {
                Some(state) => {
                    if state.is_studied() {
                        studied += 1;
                    }
                    if state.is_due(now) {
                        due_cards.push(card.clone());
                    }
                }
                None => new += 1,
            }
        }

        DueOutput {
            success: true,
            deck: deck_id.to_string(),
            total: manifest.cards.len(),
            due: due_cards.len(),
            new,
            studied,
            due_cards,
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &DueOutput, options: &DueOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &DueOutput) -> String {
        if !output.success {
            return format!(
                "Due failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut text = format!(
            "Deck {}: {} due, {} new, {} studied ({} cards)\n",
            output.deck, output.due, output.new, output.studied, output.total
        );
        for card in &output.due_cards {
            text.push_str(&format!("  {}\n", card));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{DeckManifest, DeckProvider};
    use crate::error::{Result, TrellisError};
    use crate::srs::{schedule, Grade, MemoryState};
    use crate::storage::InMemoryStateStore;
    use std::sync::Arc;

    struct FixedDecks(DeckManifest);

    impl DeckProvider for FixedDecks {
        fn deck(&self, deck_id: &str) -> Result<DeckManifest> {
            if deck_id == self.0.id {
                Ok(self.0.clone())
            } else {
                Err(TrellisError::deck_not_found(deck_id))
            }
        }
    }

    fn manifest() -> DeckManifest {
        DeckManifest {
            id: "band-a-1".to_string(),
            title: Some("Band A.1".to_string()),
            cards: vec!["ni-hao".to_string(), "xie-xie".to_string(), "zai-jian".to_string()],
        }
    }

    #[test]
    fn test_due_counts_split_by_record() {
        let states = Arc::new(InMemoryStateStore::new());
        let now = Utc::now();

        let mut map = crate::srs::MemoryMap::new();
        // Studied a week ago: due now.
        let old = now - chrono::Duration::days(7);
        map.insert(
            "ni-hao".to_string(),
            schedule(&MemoryState::initial(old), Grade::Good, old),
        );
        // Studied just now: due tomorrow.
        map.insert(
            "xie-xie".to_string(),
            schedule(&MemoryState::initial(now), Grade::Good, now),
        );
        states.save("band-a-1", &map).unwrap();

        let cmd = DueCommand::new(states, FixedDecks(manifest()));
        let output = cmd.run("band-a-1", now, &DueOptions::default());

        assert!(output.success);
        assert_eq!(output.total, 3);
        assert_eq!(output.due, 1);
        assert_eq!(output.new, 1);
        assert_eq!(output.studied, 2);
        assert_eq!(output.due_cards, vec!["ni-hao".to_string()]);
    }

    #[test]
    fn test_due_unknown_deck_fails() {
        let cmd = DueCommand::new(Arc::new(InMemoryStateStore::new()), FixedDecks(manifest()));
        let output = cmd.run("missing", Utc::now(), &DueOptions::default());

        assert!(!output.success);
        assert!(output.error.as_deref().unwrap().contains("missing"));
    }

    #[test]
    fn test_due_fresh_deck_all_new() {
        let cmd = DueCommand::new(Arc::new(InMemoryStateStore::new()), FixedDecks(manifest()));
        let output = cmd.run("band-a-1", Utc::now(), &DueOptions::default());

        assert!(output.success);
        assert_eq!(output.new, 3);
        assert_eq!(output.due, 0);
        assert_eq!(output.studied, 0);
    }

    #[test]
    fn test_format_human_readable_lists_due_cards() {
        let states = Arc::new(InMemoryStateStore::new());
        let now = Utc::now();
        let mut map = crate::srs::MemoryMap::new();
        map.insert("ni-hao".to_string(), MemoryState::initial(now));
        states.save("band-a-1", &map).unwrap();

        let cmd = DueCommand::new(states, FixedDecks(manifest()));
        let output = cmd.run("band-a-1", now, &DueOptions::default());
        let text = cmd.format_output(&output, &DueOptions::default());

        assert!(text.contains("1 due, 2 new"));
        assert!(text.contains("  ni-hao\n"));
    }
}
