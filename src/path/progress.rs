//! Per-node step-attempt history.
//!
//! Progress records are persisted in the legacy wire shape. Older exports
//! may lack `history` or `updatedAt`; [`NodeProgress::normalize`] upgrades
//! them on read by synthesizing a single-entry history from the legacy
//! `lastScore`/`lastTotal`/`updatedAt` fields. The gate engine only ever
//! sees normalized records.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrellisError;

/// Most-recent attempts retained per step; oldest evicted first.
pub const HISTORY_LIMIT: usize = 20;

/// One of the five curriculum activities within a node.
///
/// Wire names are the legacy keys (`quick`, `reader`, `listen`); the modern
/// names are accepted as aliases on read. Ordering follows the canonical
/// pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum StepKind {
    #[serde(rename = "study")]
    Study,
    #[serde(rename = "quick", alias = "quiz")]
    Quiz,
    #[serde(rename = "reader", alias = "reading")]
    Reading,
    #[serde(rename = "listen", alias = "listening")]
    Listening,
    #[serde(rename = "grammar")]
    Grammar,
}

impl StepKind {
    /// All steps in pipeline order.
    pub const ALL: [StepKind; 5] = [
        StepKind::Study,
        StepKind::Quiz,
        StepKind::Reading,
        StepKind::Listening,
        StepKind::Grammar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Study => "study",
            StepKind::Quiz => "quiz",
            StepKind::Reading => "reading",
            StepKind::Listening => "listening",
            StepKind::Grammar => "grammar",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialize an optional step with its modern name.
///
/// The legacy keys belong to persisted step maps only; derived output that
/// is never read back (status reports, path overviews) uses the modern
/// vocabulary.
pub(crate) fn serialize_step_modern<S>(
    step: &Option<StepKind>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match step {
        Some(kind) => serializer.serialize_str(kind.as_str()),
        None => serializer.serialize_none(),
    }
}

impl FromStr for StepKind {
    type Err = TrellisError;

    /// Accepts both the modern and the legacy wire names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "study" => Ok(StepKind::Study),
            "quiz" | "quick" => Ok(StepKind::Quiz),
            "reading" | "reader" => Ok(StepKind::Reading),
            "listening" | "listen" => Ok(StepKind::Listening),
            "grammar" => Ok(StepKind::Grammar),
            other => Err(TrellisError::content(format!("unknown step: {}", other))),
        }
    }
}

/// One completed attempt of a step. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepAttempt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(rename = "completedAt", with = "chrono::serde::ts_milliseconds")]
    pub completed_at: DateTime<Utc>,
}

/// Accumulated progress for a single step of a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    #[serde(default)]
    pub attempts: u32,
    #[serde(rename = "lastScore", default, skip_serializing_if = "Option::is_none")]
    pub last_score: Option<u32>,
    #[serde(rename = "lastTotal", default, skip_serializing_if = "Option::is_none")]
    pub last_total: Option<u32>,
    #[serde(
        rename = "updatedAt",
        with = "chrono::serde::ts_milliseconds",
        default = "epoch"
    )]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<StepAttempt>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

impl Default for StepProgress {
    fn default() -> Self {
        Self {
            attempts: 0,
            last_score: None,
            last_total: None,
            updated_at: epoch(),
            history: Vec::new(),
        }
    }
}

impl StepProgress {
    /// Upgrade a record read from storage.
    ///
    /// Re-bounds the history, synthesizes a single-entry history for legacy
    /// records that predate the history field, and raises `attempts` so it
    /// never undercounts the retained history.
    pub fn normalize(&mut self) {
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }

        if self.history.is_empty() && self.updated_at > epoch() {
            self.history.push(StepAttempt {
                score: self.last_score,
                total: self.last_total,
                completed_at: self.updated_at,
            });
        }

        if (self.attempts as usize) < self.history.len() {
            self.attempts = self.history.len() as u32;
        }
    }

    /// Append a completed attempt, updating the last-score fields and
    /// evicting the oldest history entry past [`HISTORY_LIMIT`].
    pub fn record_attempt(
        &mut self,
        score: Option<u32>,
        total: Option<u32>,
        now: DateTime<Utc>,
    ) {
        self.attempts += 1;
        self.updated_at = now;
        if score.is_some() {
            self.last_score = score;
        }
        if total.is_some() {
            self.last_total = total;
        }
        self.history.push(StepAttempt {
            score,
            total,
            completed_at: now,
        });
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}

/// All recorded progress for one curriculum node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeProgress {
    /// First study action on this node. Set once, never overwritten.
    #[serde(
        rename = "startedAt",
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub steps: BTreeMap<StepKind, StepProgress>,
}

impl NodeProgress {
    /// Normalize every step record. Called at the storage boundary.
    pub fn normalize(&mut self) {
        for step in self.steps.values_mut() {
            step.normalize();
        }
    }

    pub fn step(&self, kind: StepKind) -> Option<&StepProgress> {
        self.steps.get(&kind)
    }

    /// Stamp the node as started if it isn't already.
    pub fn mark_started(&mut self, now: DateTime<Utc>) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Record a completed step attempt. Also stamps `started_at` on a node
    /// whose first recorded action is a step completion.
    pub fn mark_step(
        &mut self,
        kind: StepKind,
        score: Option<u32>,
        total: Option<u32>,
        now: DateTime<Utc>,
    ) {
        let step = self.steps.entry(kind).or_default();
        step.normalize();
        step.record_attempt(score, total, now);
        self.mark_started(now);
    }
}

// =============================================================================
// Tests
// =============================================================================
