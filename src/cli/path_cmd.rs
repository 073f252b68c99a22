//! Path command for Trellis.
//!
//! Walks the curriculum from its start node and shows where the learner
//! stands on each node: done, in progress, or not yet started.

use serde::Serialize;

use crate::deck::{DeckManifest, DeckProvider};
use crate::error::FailOpen;
use crate::path::{compute_status, PathDoc, StepKind};
use crate::storage::{ProgressStore, StateStore};

/// Options for the path command.
#[derive(Debug, Clone, Default)]
pub struct PathOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// One node's place in the walk.
#[derive(Debug, Clone, Serialize)]
pub struct PathNodeOverview {
    pub id: String,
    pub title: String,
    #[serde(rename = "deckId")]
    pub deck_id: String,
    /// Fraction of the deck studied so far.
    pub coverage: f64,
    /// `None` once every step and gate is satisfied.
    #[serde(
        rename = "nextRequiredStep",
        serialize_with = "crate::path::progress::serialize_step_modern"
    )]
    pub next_required_step: Option<StepKind>,
    pub complete: bool,
}

/// Output format for the path command.
#[derive(Debug, Clone, Serialize)]
pub struct PathOutput {
    pub nodes: Vec<PathNodeOverview>,
}

/// The path command implementation.
pub struct PathCommand<S: StateStore, P: ProgressStore, D: DeckProvider> {
    states: S,
    progress: P,
    decks: D,
}

impl<S: StateStore, P: ProgressStore, D: DeckProvider> PathCommand<S, P, D> {
    /// Create a new path command.
    pub fn new(states: S, progress: P, decks: D) -> Self {
        Self {
            states,
            progress,
            decks,
        }
    }

    /// Walk `doc` from its start node, following `next` links.
    ///
    /// The document has already been validated, so the walk terminates and
    /// every link resolves.
    pub fn run(&self, doc: &PathDoc, _options: &PathOptions) -> PathOutput {
        let mut nodes = Vec::new();
        let mut current = Some(doc.start.as_str());

        while let Some(id) = current {
            let Some(node) = doc.node(id) else {
                break;
            };

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

            nodes.push(PathNodeOverview {
                id: node.id.clone(),
                title: node.title.clone(),
                deck_id: node.deck_id.clone(),
                coverage: status.coverage,
                next_required_step: status.next_required_step,
                complete: status.next_required_step.is_none(),
            });

            current = node.next.as_deref();
        }

        PathOutput { nodes }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &PathOutput, options: &PathOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &PathOutput) -> String {
        let mut text = String::new();
        let mut seen_current = false;

        for node in &output.nodes {
            let marker = if node.complete {
                "[done]   "
            } else if !seen_current {
                seen_current = true;
                "[current]"
            } else {
                "[ahead]  "
            };
            let next = match node.next_required_step {
                Some(step) => format!("next: {}", step),
                None => "complete".to_string(),
            };
            text.push_str(&format!(
                "{} {} ({}) deck {}, {:.0}% studied, {}\n",
                marker,
                node.title,
                node.id,
                node.deck_id,
                node.coverage * 100.0,
                next,
            ));
        }
        text
    }
}
