//! Node status computation: coverage, gate evaluation, step locks, and
//! next-step resolution.
//!
//! Everything here is a pure function of its inputs. Status is derived on
//! demand and never persisted; callers re-run [`compute_status`] whenever
//! the underlying memory states or progress change.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::path::document::PathNode;
use crate::path::progress::{NodeProgress, StepKind, StepProgress};
use crate::srs::MemoryMap;

/// How much of a deck has been studied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coverage {
    /// Cards studied at least once.
    pub studied: usize,
    /// Studied fraction of the deck; 0 for an empty deck.
    pub fraction: f64,
}

/// Deck coverage over the given memory states.
///
/// A card counts as studied iff its state has a repetition streak or a
/// scheduled interval. Due dates are never consulted here.
pub fn coverage(deck_cards: &[String], states: &MemoryMap) -> Coverage {
    if deck_cards.is_empty() {
        return Coverage {
            studied: 0,
            fraction: 0.0,
        };
    }

    let studied = deck_cards
        .iter()
        .filter(|id| states.get(id.as_str()).is_some_and(|s| s.is_studied()))
        .count();

    Coverage {
        studied,
        fraction: studied as f64 / deck_cards.len() as f64,
    }
}

/// Summary of one step's recorded attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepSummary {
    pub attempts: u32,
    #[serde(rename = "lastScore", skip_serializing_if = "Option::is_none")]
    pub last_score: Option<u32>,
    #[serde(rename = "lastTotal", skip_serializing_if = "Option::is_none")]
    pub last_total: Option<u32>,
    /// `100 * lastScore / lastTotal`, absent until a scored attempt exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StepSummary {
    fn from_progress(step: Option<&StepProgress>) -> Self {
        let Some(step) = step else {
            return Self::default();
        };
        let percent = match (step.last_score, step.last_total) {
            (Some(score), Some(total)) if total > 0 => Some(score as f64 / total as f64 * 100.0),
            _ => None,
        };
        Self {
            attempts: step.attempts,
            last_score: step.last_score,
            last_total: step.last_total,
            percent,
            updated_at: (step.updated_at > DateTime::UNIX_EPOCH).then_some(step.updated_at),
        }
    }
}

/// A step summary plus its declared score gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatedStepSummary {
    #[serde(flatten)]
    pub summary: StepSummary,
    /// Declared requirement as a percent; 0 means attempt-only.
    pub requirement: f64,
    pub met: bool,
}

impl GatedStepSummary {
    /// A positive requirement demands a qualifying last score; a zero or
    /// absent requirement is satisfied by any attempt.
    fn evaluate(summary: StepSummary, requirement: f64) -> Self {
        let met = if requirement > 0.0 {
            summary.percent.unwrap_or(0.0) >= requirement
        } else {
            summary.attempts > 0
        };
        Self {
            summary,
            requirement,
            met,
        }
    }
}

/// Which steps the caller may not legally invoke yet. `true` means locked.
///
/// Locks apply only when the corresponding gate is actually declared; a node
/// with no SRS requirement never locks its quiz, and so on. Study is never
/// locked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepLocks {
    pub quiz: bool,
    pub reading: bool,
    pub listening: bool,
    pub grammar: bool,
}

impl StepLocks {
    pub fn is_locked(&self, kind: StepKind) -> bool {
        match kind {
            StepKind::Study => false,
            StepKind::Quiz => self.quiz,
            StepKind::Reading => self.reading,
            StepKind::Listening => self.listening,
            StepKind::Grammar => self.grammar,
        }
    }
}

/// Derived status of one curriculum node. Recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeStatus {
    #[serde(rename = "deckSize")]
    pub deck_size: usize,
    #[serde(rename = "studiedCount")]
    pub studied_count: usize,
    pub coverage: f64,
    #[serde(rename = "srsRequirement")]
    pub srs_requirement: f64,
    #[serde(rename = "srsMet")]
    pub srs_met: bool,
    pub study: StepSummary,
    pub quiz: GatedStepSummary,
    pub reading: StepSummary,
    pub listening: GatedStepSummary,
    pub grammar: StepSummary,
    pub locks: StepLocks,
    /// Canonical "resume here" suggestion; `None` once the node is complete.
    #[serde(
        rename = "nextRequiredStep",
        serialize_with = "crate::path::progress::serialize_step_modern"
    )]
    pub next_required_step: Option<StepKind>,
}

/// Compute a node's derived status from its thresholds, the deck's memory
/// states, and the recorded step progress.
///
/// `progress` of `None` means the node was never touched; every summary
/// comes back with zero attempts.
pub fn compute_status(
    node: &PathNode,
    deck_cards: &[String],
    states: &MemoryMap,
    progress: Option<&NodeProgress>,
) -> NodeStatus {
    let Coverage { studied, fraction } = coverage(deck_cards, states);

    // An empty deck never satisfies the SRS gate, even at threshold 0: there
    // is nothing to have studied.
    let srs_requirement = node.gates.srs_coverage_min;
    let srs_met = fraction >= srs_requirement && !deck_cards.is_empty();

    let step = |kind| StepSummary::from_progress(progress.and_then(|p| p.step(kind)));
    let study = step(StepKind::Study);
    let quiz = GatedStepSummary::evaluate(step(StepKind::Quiz), node.gates.quiz_min);
    let reading = step(StepKind::Reading);
    let listening =
        GatedStepSummary::evaluate(step(StepKind::Listening), node.gates.listening_min);
    let grammar = step(StepKind::Grammar);

    // First unmet item in the canonical pipeline wins. Reading and grammar
    // carry no score gate; an attempt completes them.
    let next_required_step = if study.attempts == 0 || !srs_met {
        Some(StepKind::Study)
    } else if quiz.summary.attempts == 0 || !quiz.met {
        Some(StepKind::Quiz)
    } else if reading.attempts == 0 {
        Some(StepKind::Reading)
    } else if listening.summary.attempts == 0 || !listening.met {
        Some(StepKind::Listening)
    } else if grammar.attempts == 0 {
        Some(StepKind::Grammar)
    } else {
        None
    };

    let locks = StepLocks {
        quiz: srs_requirement > 0.0 && !srs_met,
        reading: node.gates.quiz_min > 0.0 && !quiz.met,
        listening: node.gates.quiz_min > 0.0 && !quiz.met,
        grammar: node.gates.listening_min > 0.0 && !listening.met,
    };

    NodeStatus {
        deck_size: deck_cards.len(),
        studied_count: studied,
        coverage: fraction,
        srs_requirement,
        srs_met,
        study,
        quiz,
        reading,
        listening,
        grammar,
        locks,
        next_required_step,
    }
}

// =============================================================================
// Tests
// =============================================================================
