//! Per-code-block copy feedback.
//!
//! Copying a block flips its state to `Copied` and schedules a revert to
//! `Idle` after a fixed delay. Each block owns its own deadline: copying
//! another block never touches it, and copying the same block again
//! replaces its pending deadline.
//!
//! Deadlines are checked by the UI tick rather than by spawned timers, so
//! state only changes inside the reducer.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a block shows "copied" after a successful copy.
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

/// Identity of a code block in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId {
    /// Index of the turn in the transcript.
    pub turn: usize,
    /// Position of the code block within that turn (0-based).
    pub ordinal: usize,
}

impl BlockId {
    pub fn new(turn: usize, ordinal: usize) -> Self {
        Self { turn, ordinal }
    }
}

/// Copy affordance state of a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyState {
    #[default]
    Idle,
    Copied,
}

/// Tracks revert deadlines for copied blocks.
#[derive(Debug, Clone)]
pub struct CopyTracker {
    delay: Duration,
    deadlines: HashMap<BlockId, Instant>,
}

impl Default for CopyTracker {
    fn default() -> Self {
        Self::new(COPY_FEEDBACK)
    }
}

impl CopyTracker {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadlines: HashMap::new(),
        }
    }

    /// Marks a block as copied now.
    pub fn mark_copied(&mut self, block: BlockId) {
        self.mark_copied_at(block, Instant::now());
    }

    /// Marks a block as copied at `now`, replacing any pending revert.
    pub fn mark_copied_at(&mut self, block: BlockId, now: Instant) {
        self.deadlines.insert(block, now + self.delay);
    }

    pub fn state(&self, block: BlockId) -> CopyState {
        self.state_at(block, Instant::now())
    }

    pub fn state_at(&self, block: BlockId, now: Instant) -> CopyState {
        match self.deadlines.get(&block) {
            Some(deadline) if *deadline > now => CopyState::Copied,
            _ => CopyState::Idle,
        }
    }

    /// Returns true while any block is waiting to revert.
    pub fn has_pending(&self) -> bool {
        !self.deadlines.is_empty()
    }

    /// Drops elapsed deadlines. Returns the reverted blocks in order.
    pub fn expire(&mut self) -> Vec<BlockId> {
        self.expire_at(Instant::now())
    }

    pub fn expire_at(&mut self, now: Instant) -> Vec<BlockId> {
        let mut reverted: Vec<BlockId> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(block, _)| *block)
            .collect();
        for block in &reverted {
            self.deadlines.remove(block);
        }
        reverted.sort();
        reverted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: BlockId = BlockId { turn: 1, ordinal: 0 };
    const B: BlockId = BlockId { turn: 3, ordinal: 1 };

    #[test]
    fn test_copy_then_revert_after_delay() {
        let start = Instant::now();
        let mut tracker = CopyTracker::default();
        assert_eq!(tracker.state_at(A, start), CopyState::Idle);

        tracker.mark_copied_at(A, start);
        assert_eq!(tracker.state_at(A, start), CopyState::Copied);
        assert_eq!(
            tracker.state_at(A, start + Duration::from_millis(1999)),
            CopyState::Copied
        );
        assert_eq!(tracker.state_at(A, start + COPY_FEEDBACK), CopyState::Idle);

        assert!(tracker.expire_at(start + Duration::from_secs(1)).is_empty());
        assert_eq!(tracker.expire_at(start + COPY_FEEDBACK), vec![A]);
        assert!(!tracker.has_pending());
    }

    #[test]
    fn test_blocks_have_independent_timers() {
        let start = Instant::now();
        let mut tracker = CopyTracker::default();
        tracker.mark_copied_at(A, start);
        tracker.mark_copied_at(B, start + Duration::from_secs(1));

        let at = start + Duration::from_millis(2500);
        assert_eq!(tracker.expire_at(at), vec![A]);
        assert_eq!(tracker.state_at(A, at), CopyState::Idle);
        assert_eq!(tracker.state_at(B, at), CopyState::Copied);

        assert_eq!(tracker.expire_at(start + Duration::from_secs(3)), vec![B]);
    }

    #[test]
    fn test_recopy_reschedules_only_that_block() {
        let start = Instant::now();
        let mut tracker = CopyTracker::default();
        tracker.mark_copied_at(A, start);
        tracker.mark_copied_at(A, start + Duration::from_secs(1));

        let at = start + Duration::from_millis(2500);
        assert!(tracker.expire_at(at).is_empty());
        assert_eq!(tracker.state_at(A, at), CopyState::Copied);
    }

    #[test]
    fn test_custom_delay() {
        let start = Instant::now();
        let mut tracker = CopyTracker::new(Duration::from_millis(50));
        tracker.mark_copied_at(A, start);
        assert_eq!(
            tracker.state_at(A, start + Duration::from_millis(49)),
            CopyState::Copied
        );
        assert_eq!(tracker.expire_at(start + Duration::from_millis(50)), vec![A]);
        assert!(!tracker.has_pending());
    }
}
