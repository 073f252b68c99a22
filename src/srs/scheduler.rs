//! SM-2-derived review scheduler.
//!
//! [`schedule`] maps (previous state, grade, now) to the next state. It is a
//! pure function: `now` is always an explicit parameter, and the function is
//! total over the [`Grade`] enum. Lapse bookkeeping is deliberately *not*
//! done here; see [`crate::srs::leech`].

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lower ease bound.
pub const MIN_EASE: f64 = 1.3;
/// Upper ease bound.
pub const MAX_EASE: f64 = 2.8;
/// Ease assigned to a card that has never been graded.
pub const DEFAULT_EASE: f64 = 2.5;

/// Learner's self-assessed recall quality for a single review.
///
/// The numeric values (0/3/4/5) are the SM-2 quality scale; only `Fail` is
/// classified as failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Fail,
    Hard,
    Good,
    Easy,
}

impl Grade {
    /// All grades, in ascending quality order.
    pub const ALL: [Grade; 4] = [Grade::Fail, Grade::Hard, Grade::Good, Grade::Easy];

    /// SM-2 quality value for this grade.
    pub fn quality(self) -> u8 {
        match self {
            Grade::Fail => 0,
            Grade::Hard => 3,
            Grade::Good => 4,
            Grade::Easy => 5,
        }
    }

    /// Parse an SM-2 quality value. Values outside {0, 3, 4, 5} are a caller
    /// contract violation and yield `None`.
    pub fn from_quality(quality: u8) -> Option<Self> {
        match quality {
            0 => Some(Grade::Fail),
            3 => Some(Grade::Hard),
            4 => Some(Grade::Good),
            5 => Some(Grade::Easy),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Fail => "fail",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }

    /// Whether this grade resets the repetition streak.
    pub fn is_failing(self) -> bool {
        matches!(self, Grade::Fail)
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Grade {
    type Err = crate::error::TrellisError;

    /// Accepts grade names and raw SM-2 quality values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" | "0" => Ok(Grade::Fail),
            "hard" | "3" => Ok(Grade::Hard),
            "good" | "4" => Ok(Grade::Good),
            "easy" | "5" => Ok(Grade::Easy),
            other => Err(crate::error::TrellisError::content(format!(
                "Unknown grade '{}' (expected fail, hard, good, or easy)",
                other
            ))),
        }
    }
}

/// Per-card spaced-repetition state.
///
/// Serialized in the legacy wire shape (`ef`/`interval`/`reps`/`due` with
/// `due` as epoch milliseconds) so exported learner data stays readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    /// Ease factor, clamped to [`MIN_EASE`]..=[`MAX_EASE`].
    #[serde(rename = "ef")]
    pub ease: f64,
    /// Current inter-review interval in days.
    #[serde(rename = "interval")]
    pub interval_days: u32,
    /// Consecutive successful repetitions.
    #[serde(rename = "reps")]
    pub repetitions: u32,
    /// When the card next comes due.
    #[serde(rename = "due", with = "chrono::serde::ts_milliseconds")]
    pub due_at: DateTime<Utc>,
    /// Failing reviews recorded by the leech policy. Absent in older records.
    #[serde(default)]
    pub lapses: u32,
}

impl MemoryState {
    /// State for a card that has never been graded: due immediately.
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            ease: DEFAULT_EASE,
            interval_days: 0,
            repetitions: 0,
            due_at: now,
            lapses: 0,
        }
    }

    /// A card is due at instant `at` iff its due time has been reached
    /// (boundary inclusive).
    pub fn is_due(&self, at: DateTime<Utc>) -> bool {
        self.due_at <= at
    }

    /// Whether this card counts toward deck coverage: it has been graded at
    /// least once (a repetition streak or a scheduled interval exists).
    pub fn is_studied(&self) -> bool {
        self.repetitions > 0 || self.interval_days > 0
    }
}

/// Per-deck map of card id to memory state.
pub type MemoryMap = HashMap<String, MemoryState>;

/// Compute the next memory state after grading a card at instant `now`.
///
/// A failing grade resets the streak and schedules a one-day retry without
/// touching the ease factor. A passing grade walks the SM-2 interval ladder
/// (1 day, 6 days, then `round(interval * ease)`) and applies the SM-2 ease
/// delta, clamped to [`MIN_EASE`]..=[`MAX_EASE`].
///
/// `lapses` is carried through unchanged; counting lapses belongs to the
/// leech policy, not the transition rule.
pub fn schedule(prev: &MemoryState, grade: Grade, now: DateTime<Utc>) -> MemoryState {
    let mut ease = prev.ease;
    let mut reps = prev.repetitions;
    let interval_days;

    if grade.is_failing() {
        reps = 0;
        interval_days = 1;
    } else {
        interval_days = match reps {
            0 => 1,
            1 => 6,
            // Promote with the pre-update ease, as SM-2 specifies.
            _ => (prev.interval_days as f64 * ease).round() as u32,
        };
        let q = grade.quality() as f64;
        ease += 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
        ease = ease.clamp(MIN_EASE, MAX_EASE);
        reps += 1;
    }

    MemoryState {
        ease,
        interval_days,
        repetitions: reps,
        due_at: now + Duration::days(interval_days as i64),
        lapses: prev.lapses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let now = at(1_000);
        let state = MemoryState::initial(now);
        assert_eq!(state.ease, DEFAULT_EASE);
        assert_eq!(state.interval_days, 0);
        assert_eq!(state.repetitions, 0);
        assert_eq!(state.due_at, now);
        assert_eq!(state.lapses, 0);
    }

    #[test]
    fn test_fail_resets_streak_regardless_of_history() {
        let now = at(0);
        let mature = MemoryState {
            ease: 2.1,
            interval_days: 42,
            repetitions: 7,
            due_at: now,
            lapses: 1,
        };
        let next = schedule(&mature, Grade::Fail, now);
        assert_eq!(next.repetitions, 0);
        assert_eq!(next.interval_days, 1);
        // Ease is untouched on failure.
        assert_eq!(next.ease, 2.1);
        // Lapse counting is the leech policy's job.
        assert_eq!(next.lapses, 1);
    }

    #[test]
    fn test_first_good_then_second_good() {
        let now = at(0);
        let s0 = MemoryState::initial(now);
        let s1 = schedule(&s0, Grade::Good, now);
        assert_eq!(s1.repetitions, 1);
        assert_eq!(s1.interval_days, 1);
        let s2 = schedule(&s1, Grade::Good, now);
        assert_eq!(s2.repetitions, 2);
        assert_eq!(s2.interval_days, 6);
    }

    #[test]
    fn test_third_review_promotes_with_previous_ease() {
        let now = at(0);
        let prev = MemoryState {
            ease: 2.5,
            interval_days: 6,
            repetitions: 2,
            due_at: now,
            lapses: 0,
        };
        let next = schedule(&prev, Grade::Good, now);
        // 6 * 2.5 = 15, using the ease before the SM-2 delta is applied.
        assert_eq!(next.interval_days, 15);
        assert_eq!(next.repetitions, 3);
    }

    #[test]
    fn test_ease_updates_per_grade() {
        let now = at(0);
        let prev = MemoryState {
            ease: 2.5,
            interval_days: 6,
            repetitions: 2,
            due_at: now,
            lapses: 0,
        };
        // q=5: +0.1, q=4: unchanged, q=3: -0.14.
        assert!((schedule(&prev, Grade::Easy, now).ease - 2.6).abs() < 1e-9);
        assert!((schedule(&prev, Grade::Good, now).ease - 2.5).abs() < 1e-9);
        assert!((schedule(&prev, Grade::Hard, now).ease - 2.36).abs() < 1e-9);
    }

    #[test]
    fn test_ease_clamps_at_bounds() {
        let now = at(0);
        let low = MemoryState {
            ease: MIN_EASE,
            interval_days: 6,
            repetitions: 2,
            due_at: now,
            lapses: 0,
        };
        assert_eq!(schedule(&low, Grade::Hard, now).ease, MIN_EASE);

        let high = MemoryState {
            ease: MAX_EASE,
            interval_days: 6,
            repetitions: 2,
            due_at: now,
            lapses: 0,
        };
        assert_eq!(schedule(&high, Grade::Easy, now).ease, MAX_EASE);
    }

    #[test]
    fn test_due_at_is_exact_millisecond_arithmetic() {
        let now_ms: i64 = 1_700_000_000_123;
        let now = at(now_ms);
        let s0 = MemoryState::initial(now);
        for grade in Grade::ALL {
            let next = schedule(&s0, grade, now);
            let expected = now_ms + next.interval_days as i64 * 86_400_000;
            assert_eq!(next.due_at.timestamp_millis(), expected);
        }
    }

    #[test]
    fn test_is_due_boundary_inclusive() {
        let due = at(5_000);
        let state = MemoryState {
            due_at: due,
            ..MemoryState::initial(due)
        };
        assert!(!state.is_due(at(4_999)));
        assert!(state.is_due(at(5_000)));
        assert!(state.is_due(at(5_001)));
    }

    #[test]
    fn test_is_studied() {
        let now = at(0);
        let fresh = MemoryState::initial(now);
        assert!(!fresh.is_studied());
        assert!(schedule(&fresh, Grade::Good, now).is_studied());
        // A failed-only card still counts: it carries a one-day interval.
        assert!(schedule(&fresh, Grade::Fail, now).is_studied());
    }

    #[test]
    fn test_grade_quality_round_trip() {
        for grade in Grade::ALL {
            assert_eq!(Grade::from_quality(grade.quality()), Some(grade));
        }
        assert_eq!(Grade::from_quality(1), None);
        assert_eq!(Grade::from_quality(2), None);
        assert_eq!(Grade::from_quality(6), None);
    }

    #[test]
    fn test_wire_shape_round_trip() {
        let state = MemoryState {
            ease: 2.36,
            interval_days: 15,
            repetitions: 3,
            due_at: at(1_700_000_000_000),
            lapses: 2,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"ef\":"));
        assert!(json.contains("\"interval\":"));
        assert!(json.contains("\"reps\":"));
        assert!(json.contains("\"due\":1700000000000"));
        let parsed: MemoryState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_legacy_record_without_lapses() {
        let json = r#"{"ef":2.5,"interval":1,"reps":1,"due":1700000000000}"#;
        let state: MemoryState = serde_json::from_str(json).unwrap();
        assert_eq!(state.lapses, 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_grade() -> impl Strategy<Value = Grade> {
            prop_oneof![
                Just(Grade::Fail),
                Just(Grade::Hard),
                Just(Grade::Good),
                Just(Grade::Easy),
            ]
        }

        proptest! {
            // Ease never leaves its bounds, for any grade and any in-bounds start.
            #[test]
            fn prop_ease_stays_in_bounds(
                ease in MIN_EASE..=MAX_EASE,
                interval in 0u32..1000,
                reps in 0u32..100,
                grade in arb_grade(),
            ) {
                let now = at(0);
                let prev = MemoryState { ease, interval_days: interval, repetitions: reps, due_at: now, lapses: 0 };
                let next = schedule(&prev, grade, now);
                prop_assert!(next.ease >= MIN_EASE && next.ease <= MAX_EASE);
            }

            // Grading always produces a positive interval and a future due time.
            #[test]
            fn prop_graded_card_has_interval(
                interval in 0u32..1000,
                reps in 0u32..100,
                grade in arb_grade(),
            ) {
                let now = at(1_000_000);
                let prev = MemoryState { ease: DEFAULT_EASE, interval_days: interval, repetitions: reps, due_at: now, lapses: 0 };
                let next = schedule(&prev, grade, now);
                prop_assert!(next.interval_days >= 1);
                prop_assert!(next.due_at > now);
                prop_assert!(next.is_studied());
            }

            // Repetitions only move one step: +1 on success, to zero on failure.
            #[test]
            fn prop_repetitions_step(reps in 0u32..100, grade in arb_grade()) {
                let now = at(0);
                let prev = MemoryState { ease: DEFAULT_EASE, interval_days: 3, repetitions: reps, due_at: now, lapses: 0 };
                let next = schedule(&prev, grade, now);
                if grade.is_failing() {
                    prop_assert_eq!(next.repetitions, 0);
                } else {
                    prop_assert_eq!(next.repetitions, reps + 1);
                }
            }
        }
    }
}
