//! Leech detection for chronically failing cards.
//!
//! The scheduler itself never touches lapse counts. A [`LeechPolicy`] sits
//! beside it and inspects each scheduled transition: when a review failed,
//! the policy bumps the card's lapse count and reports whether the card has
//! crossed the leech threshold and should be surfaced to the learner.

use super::scheduler::MemoryState;

/// Lapse count at which a card is considered a leech.
pub const DEFAULT_LEECH_THRESHOLD: u32 = 3;

/// Observes scheduled review transitions and maintains lapse counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeechPolicy {
    threshold: u32,
}

impl Default for LeechPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LEECH_THRESHOLD)
    }
}

impl LeechPolicy {
    /// Creates a policy that flags a card once its lapse count reaches
    /// `threshold`. A threshold of zero is clamped to one so that a card
    /// must actually lapse before it can be flagged.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Inspects the transition from `previous` to `next` (the state produced
    /// by [`schedule`](super::scheduler::schedule)). If the review failed,
    /// increments `next.lapses`. Returns `true` when the card's lapse count
    /// has reached the threshold.
    ///
    /// A failed review is recognizable from the after-state alone: the
    /// scheduler resets `repetitions` to zero on failure and always
    /// increments it on success.
    pub fn observe(&self, previous: &MemoryState, next: &mut MemoryState) -> bool {
        let failed = next.repetitions == 0;
        if failed {
            next.lapses = previous.lapses.saturating_add(1);
        }
        next.lapses >= self.threshold
    }
}

// =============================================================================
// Tests
// =============================================================================
