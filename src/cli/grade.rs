//! Grade command for Trellis.
//!
//! Records one review of one card: runs the scheduler transition, lets the
//! leech policy count lapses, and persists the updated deck state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::srs::{schedule, Grade, LeechPolicy, MemoryState};
use crate::storage::StateStore;

/// Options for the grade command.
#[derive(Debug, Clone, Default)]
pub struct GradeOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the grade command.
#[derive(Debug, Clone, Serialize)]
pub struct GradeOutput {
    /// Whether the review was recorded.
    pub success: bool,
    pub deck: String,
    pub card: String,
    pub grade: String,
    /// Days until the next review.
    #[serde(rename = "intervalDays")]
    pub interval_days: u32,
    pub ease: f64,
    #[serde(rename = "reps")]
    pub repetitions: u32,
    #[serde(rename = "due", with = "chrono::serde::ts_milliseconds")]
    pub due_at: DateTime<Utc>,
    pub lapses: u32,
    /// The card crossed the leech threshold on this review or earlier.
    pub leech: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GradeOutput {
    fn success(deck: &str, card: &str, grade: Grade, state: &MemoryState, leech: bool) -> Self {
        Self {
            success: true,
            deck: deck.to_string(),
            card: card.to_string(),
            grade: grade.to_string(),
            interval_days: state.interval_days,
            ease: state.ease,
            repetitions: state.repetitions,
            due_at: state.due_at,
            lapses: state.lapses,
            leech,
            error: None,
        }
    }

    fn failure(deck: &str, card: &str, grade: Grade, error: impl Into<String>) -> Self {
        Self {
            success: false,
            deck: deck.to_string(),
            card: card.to_string(),
            grade: grade.to_string(),
            interval_days: 0,
            ease: 0.0,
            repetitions: 0,
            due_at: DateTime::UNIX_EPOCH,
            lapses: 0,
            leech: false,
            error: Some(error.into()),
        }
    }
}

/// The grade command implementation.
pub struct GradeCommand<S: StateStore> {
    store: S,
    leech: LeechPolicy,
}

impl<S: StateStore> GradeCommand<S> {
    /// Create a new grade command.
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store,
            leech: LeechPolicy::new(config.review.leech_threshold),
        }
    }

    /// Record one review of `card` in `deck` at instant `now`.
    ///
    /// Load and save errors abort the review rather than failing open:
    /// grading against a blank map and writing it back would overwrite the
    /// learner's real state.
    pub fn run(
        &self,
        deck_id: &str,
        card_id: &str,
        grade: Grade,
        now: DateTime<Utc>,
        _options: &GradeOptions,
    ) -> GradeOutput {
        let mut map = match self.store.load(deck_id) {
            Ok(map) => map,
            Err(e) => return GradeOutput::failure(deck_id, card_id, grade, e.to_string()),
        };

        let prev = map
            .get(card_id)
            .cloned()
            .unwrap_or_else(|| MemoryState::initial(now));
        let mut next = schedule(&prev, grade, now);
        let leech = self.leech.observe(&prev, &mut next);

        map.insert(card_id.to_string(), next.clone());
        if let Err(e) = self.store.save(deck_id, &map) {
            return GradeOutput::failure(deck_id, card_id, grade, e.to_string());
        }

        tracing::debug!(
            deck = deck_id,
            card = card_id,
            grade = %grade,
            interval = next.interval_days,
            leech,
            "recorded review"
        );

        GradeOutput::success(deck_id, card_id, grade, &next, leech)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &GradeOutput, options: &GradeOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &GradeOutput) -> String {
        if !output.success {
            return format!(
                "Grade failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut text = format!(
            "Graded {} ({}): next review in {} day{}, ease {:.2}\n",
            output.card,
            output.grade,
            output.interval_days,
            if output.interval_days == 1 { "" } else { "s" },
            output.ease,
        );
        if output.leech {
            text.push_str(&format!(
                "Leech: {} lapses recorded for this card.\n",
                output.lapses
            ));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStateStore;
    use std::sync::Arc;

    fn setup() -> GradeCommand<Arc<InMemoryStateStore>> {
        GradeCommand::new(Arc::new(InMemoryStateStore::new()), Config::default())
    }

    #[test]
    fn test_grade_new_card_good() {
        let cmd = setup();
        let now = Utc::now();

        let output = cmd.run("band-a-1", "ni-hao", Grade::Good, now, &GradeOptions::default());

        assert!(output.success);
        assert_eq!(output.interval_days, 1);
        assert_eq!(output.repetitions, 1);
        assert!(!output.leech);
    }

    #[test]
    fn test_grade_persists_state() {
        let store = Arc::new(InMemoryStateStore::new());
        let cmd = GradeCommand::new(store.clone(), Config::default());
        let now = Utc::now();

        cmd.run("band-a-1", "ni-hao", Grade::Good, now, &GradeOptions::default());
        let later = now + chrono::Duration::days(2);
        let output = cmd.run("band-a-1", "ni-hao", Grade::Good, later, &GradeOptions::default());

        assert_eq!(output.repetitions, 2);
        assert_eq!(output.interval_days, 6);

        let map = store.load("band-a-1").unwrap();
        assert_eq!(map["ni-hao"].interval_days, 6);
    }

    #[test]
    fn test_grade_flags_leech_after_default_threshold() {
        let cmd = setup();
        let now = Utc::now();
        let options = GradeOptions::default();

        for expected_leech in [false, false, true] {
            let output = cmd.run("band-a-1", "stubborn", Grade::Fail, now, &options);
            assert_eq!(output.leech, expected_leech);
        }
    }

    #[test]
    fn test_format_human_readable() {
        let cmd = setup();
        let now = Utc::now();

        let output = cmd.run("band-a-1", "ni-hao", Grade::Easy, now, &GradeOptions::default());
        let text = cmd.format_output(&output, &GradeOptions::default());

        assert!(text.contains("Graded ni-hao (easy)"));
        assert!(text.contains("next review in 1 day,"));
    }

    #[test]
    fn test_format_quiet_and_json() {
        let cmd = setup();
        let now = Utc::now();
        let output = cmd.run("band-a-1", "ni-hao", Grade::Good, now, &GradeOptions::default());

        let quiet = GradeOptions {
            quiet: true,
            ..Default::default()
        };
        assert!(cmd.format_output(&output, &quiet).is_empty());

        let json = GradeOptions {
            json: true,
            ..Default::default()
        };
        let text = cmd.format_output(&output, &json);
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["grade"], "good");
        assert_eq!(parsed["intervalDays"], 1);
    }
}
