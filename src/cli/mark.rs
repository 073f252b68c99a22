//! Mark command for Trellis.
//!
//! Records completion of one curriculum step, with an optional score, and
//! persists the node's progress record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::FailOpen;
use crate::path::StepKind;
use crate::storage::ProgressStore;

/// Options for the mark command.
#[derive(Debug, Clone, Default)]
pub struct MarkOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Items answered correctly, for scored steps.
    pub score: Option<u32>,
    /// Items asked, for scored steps.
    pub total: Option<u32>,
}

/// Output format for the mark command.
#[derive(Debug, Clone, Serialize)]
pub struct MarkOutput {
    pub success: bool,
    pub node: String,
    pub step: String,
    /// Attempts recorded for this step, including this one.
    pub attempts: u32,
    #[serde(rename = "lastScore", skip_serializing_if = "Option::is_none")]
    pub last_score: Option<u32>,
    #[serde(rename = "lastTotal", skip_serializing_if = "Option::is_none")]
    pub last_total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MarkOutput {
    fn failure(node: &str, step: StepKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            node: node.to_string(),
            step: step.to_string(),
            attempts: 0,
            last_score: None,
            last_total: None,
            error: Some(error.into()),
        }
    }
}

/// The mark command implementation.
pub struct MarkCommand<P: ProgressStore> {
    store: P,
}

impl<P: ProgressStore> MarkCommand<P> {
    /// Create a new mark command.
    pub fn new(store: P) -> Self {
        Self { store }
    }

    /// Record one attempt at `step` on `node` at instant `now`.
    ///
    /// A node with no progress record yet starts from a blank one; loading
    /// errors fail open the same way.
    pub fn run(
        &self,
        node_id: &str,
        step: StepKind,
        now: DateTime<Utc>,
        options: &MarkOptions,
    ) -> MarkOutput {
        if let (Some(score), Some(total)) = (options.score, options.total) {
            if score > total {
                return MarkOutput::failure(
                    node_id,
                    step,
                    format!("Score {} exceeds total {}", score, total),
                );
            }
        }

        let mut progress = self
            .store
            .get(node_id)
            .fail_open_default("loading node progress")
            .unwrap_or_default();

        progress.mark_step(step, options.score, options.total, now);

        if let Err(e) = self.store.put(node_id, &progress) {
            return MarkOutput::failure(node_id, step, e.to_string());
        }

        // mark_step always creates the step record, so this lookup succeeds.
        let recorded = progress.step(step).cloned().unwrap_or_default();

        tracing::debug!(
            node = node_id,
            step = %step,
            attempts = recorded.attempts,
            "recorded step attempt"
        );

        MarkOutput {
            success: true,
            node: node_id.to_string(),
            step: step.to_string(),
            attempts: recorded.attempts,
            last_score: recorded.last_score,
            last_total: recorded.last_total,
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &MarkOutput, options: &MarkOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &MarkOutput) -> String {
        if !output.success {
            return format!(
                "Mark failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        match (output.last_score, output.last_total) {
            (Some(score), Some(total)) => format!(
                "Marked {} on {}: {}/{} (attempt {})\n",
                output.step, output.node, score, total, output.attempts
            ),
            _ => format!(
                "Marked {} on {} (attempt {})\n",
                output.step, output.node, output.attempts
            ),
        }
    }
}
