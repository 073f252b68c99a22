//! Status command for Trellis.
//!
//! Shows one curriculum node's derived status: deck coverage, per-step
//! attempts and gates, locks, and the suggested next step.

use serde::Serialize;

use crate::deck::{DeckManifest, DeckProvider};
use crate::error::FailOpen;
use crate::path::{compute_status, NodeStatus, PathNode, StepKind};
use crate::storage::{ProgressStore, StateStore};

/// Options for the status command.
#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the status command.
#[derive(Debug, Clone, Serialize)]
pub struct StatusOutput {
    pub node: String,
    pub title: String,
    pub deck: String,
    #[serde(flatten)]
    pub status: NodeStatus,
}

/// The status command implementation.
pub struct StatusCommand<S: StateStore, P: ProgressStore, D: DeckProvider> {
    states: S,
    progress: P,
    decks: D,
}

impl<S: StateStore, P: ProgressStore, D: DeckProvider> StatusCommand<S, P, D> {
    /// Create a new status command.
    pub fn new(states: S, progress: P, decks: D) -> Self {
        Self {
            states,
            progress,
            decks,
        }
    }

    /// Compute the derived status of `node`.
    ///
    /// A missing or unreadable deck counts as empty, which leaves every
    /// SRS gate unmet; missing state or progress reads the same as an
    /// untouched node.
    pub fn run(&self, node: &PathNode, _options: &StatusOptions) -> StatusOutput {
        let manifest = self.decks.deck(&node.deck_id).fail_open_with(
            "loading deck manifest",
            DeckManifest {
                id: node.deck_id.clone(),
                title: None,
                cards: Vec::new(),
            },
        );
        let states = self
            .states
            .load(&node.deck_id)
            .fail_open_default("loading memory states");
        let progress = self
            .progress
            .get(&node.id)
            .fail_open_default("loading node progress");

        let status = compute_status(node, &manifest.cards, &states, progress.as_ref());

        StatusOutput {
            node: node.id.clone(),
            title: node.title.clone(),
            deck: node.deck_id.clone(),
            status,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StatusOutput, options: &StatusOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &StatusOutput) -> String {
        let s = &output.status;
        let mut text = format!("{} ({})\n", output.title, output.node);
        text.push_str(&format!(
            "  deck {}: {}/{} studied ({:.0}% coverage, requires {:.0}%) [{}]\n",
            output.deck,
            s.studied_count,
            s.deck_size,
            s.coverage * 100.0,
            s.srs_requirement * 100.0,
            if s.srs_met { "met" } else { "not met" },
        ));

        text.push_str(&format!(
            "  study:     {}\n",
            Self::describe_plain(s.study.attempts)
        ));
        text.push_str(&format!(
            "  quiz:      {}\n",
            Self::describe_gated(&s.quiz, s.locks.is_locked(StepKind::Quiz))
        ));
        text.push_str(&format!(
            "  reading:   {}\n",
            Self::describe_step(s.reading.attempts, s.locks.is_locked(StepKind::Reading))
        ));
        text.push_str(&format!(
            "  listening: {}\n",
            Self::describe_gated(&s.listening, s.locks.is_locked(StepKind::Listening))
        ));
        text.push_str(&format!(
            "  grammar:   {}\n",
            Self::describe_step(s.grammar.attempts, s.locks.is_locked(StepKind::Grammar))
        ));

        match s.next_required_step {
            Some(step) => text.push_str(&format!("  next: {}\n", step)),
            None => text.push_str("  complete\n"),
        }
        text
    }

    fn describe_plain(attempts: u32) -> String {
        if attempts == 0 {
            "not started".to_string()
        } else {
            format!("{} attempt{}", attempts, if attempts == 1 { "" } else { "s" })
        }
    }

    fn describe_step(attempts: u32, locked: bool) -> String {
        if locked {
            "locked".to_string()
        } else {
            Self::describe_plain(attempts)
        }
    }

    fn describe_gated(gated: &crate::path::GatedStepSummary, locked: bool) -> String {
        if locked {
            return "locked".to_string();
        }
        let mut text = Self::describe_plain(gated.summary.attempts);
        if let (Some(score), Some(total)) = (gated.summary.last_score, gated.summary.last_total) {
            text.push_str(&format!(", last {}/{}", score, total));
        }
        if gated.requirement > 0.0 {
            text.push_str(&format!(
                ", requires {:.0}% [{}]",
                gated.requirement,
                if gated.met { "met" } else { "not met" }
            ));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::FileDeckProvider;
    use crate::path::document::GateThresholds;
    use crate::srs::{schedule, Grade, MemoryMap, MemoryState};
    use crate::storage::{InMemoryProgressStore, InMemoryStateStore};
    use chrono::Utc;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn make_node() -> PathNode {
        PathNode {
            id: "intro".to_string(),
            title: "Greetings".to_string(),
            deck_id: "band-a-1".to_string(),
            gates: GateThresholds {
                srs_coverage_min: 0.5,
                quiz_min: 80.0,
                listening_min: 0.0,
            },
            next: None,
        }
    }

    fn setup(
        cards: &[&str],
    ) -> (
        StatusCommand<Arc<InMemoryStateStore>, Arc<InMemoryProgressStore>, FileDeckProvider>,
        Arc<InMemoryStateStore>,
        Arc<InMemoryProgressStore>,
        TempDir,
    ) {
        let dir = TempDir::new().unwrap();
        let manifest = serde_json::json!({
            "id": "band-a-1",
            "cards": cards,
        });
        fs::write(dir.path().join("band-a-1.json"), manifest.to_string()).unwrap();

        let states = Arc::new(InMemoryStateStore::new());
        let progress = Arc::new(InMemoryProgressStore::new());
        let cmd = StatusCommand::new(
            states.clone(),
            progress.clone(),
            FileDeckProvider::new(dir.path()),
        );
        (cmd, states, progress, dir)
    }

    #[test]
    fn test_status_untouched_node() {
        let (cmd, _states, _progress, _dir) = setup(&["a", "b"]);
        let output = cmd.run(&make_node(), &StatusOptions::default());

        assert_eq!(output.status.deck_size, 2);
        assert_eq!(output.status.studied_count, 0);
        assert!(!output.status.srs_met);
        assert_eq!(output.status.next_required_step, Some(StepKind::Study));
        assert!(output.status.locks.quiz);
    }

    #[test]
    fn test_status_missing_deck_reads_as_empty() {
        let (cmd, _states, _progress, _dir) = setup(&["a"]);
        let mut node = make_node();
        node.deck_id = "nonexistent".to_string();

        let output = cmd.run(&node, &StatusOptions::default());

        assert_eq!(output.status.deck_size, 0);
        assert!(!output.status.srs_met);
    }

    #[test]
    fn test_status_reflects_studied_cards() {
        let (cmd, states, _progress, _dir) = setup(&["a", "b"]);
        let now = Utc::now();

        let mut map = MemoryMap::new();
        map.insert(
            "a".to_string(),
            schedule(&MemoryState::initial(now), Grade::Good, now),
        );
        states.save("band-a-1", &map).unwrap();

        let output = cmd.run(&make_node(), &StatusOptions::default());

        assert_eq!(output.status.studied_count, 1);
        assert!(output.status.srs_met);
        assert!(!output.status.locks.quiz);
    }

    #[test]
    fn test_status_json_uses_wire_names() {
        let (cmd, _states, _progress, _dir) = setup(&["a"]);
        let output = cmd.run(&make_node(), &StatusOptions::default());
        let options = StatusOptions {
            json: true,
            ..Default::default()
        };
        let text = cmd.format_output(&output, &options);
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed["deckSize"], 1);
        assert_eq!(parsed["srsMet"], false);
        assert_eq!(parsed["nextRequiredStep"], "study");
    }

    #[test]
    fn test_format_human_readable_shows_locks() {
        let (cmd, _states, _progress, _dir) = setup(&["a", "b"]);
        let output = cmd.run(&make_node(), &StatusOptions::default());
        let text = cmd.format_output(&output, &StatusOptions::default());

        assert!(text.contains("Greetings (intro)"));
        assert!(text.contains("quiz:      locked"));
        assert!(text.contains("next: study"));
    }
}
