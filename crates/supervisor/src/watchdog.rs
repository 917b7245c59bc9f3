//! Stall detection for the 100 ms application-task poll.
//!
//! Tracks the last-observed `dma_completions` value and how many
//! consecutive polls have seen no progress while the PIB state machine sits
//! in a state that should be making progress. Three consecutive stalled
//! polls (≈ 300 ms at the configured cadence) trip recovery.

use platform::config::{BUSY_OR_WAIT_SET, WATCHDOG_STALL_THRESHOLD};

/// Per-session stall tracker.
#[derive(Debug, Clone, Copy, Default)]
pub struct StallWatchdog {
    prev_dma_completions: u32,
    consecutive_stall_polls: u8,
}

impl StallWatchdog {
    /// A tracker with no history, as at session start.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            prev_dma_completions: 0,
            consecutive_stall_polls: 0,
        }
    }

    /// Clear all history. Called on session start, stop, and successful
    /// recovery so a prior session's counts never bleed into the next.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Feed one poll's observation. `sm_state` is the PIB state machine's
    /// current state byte. Returns `true` once
    /// [`WATCHDOG_STALL_THRESHOLD`] consecutive stalled polls have been
    /// observed.
    pub fn observe(&mut self, dma_completions: u32, sm_state: u8) -> bool {
        let progressing_state = BUSY_OR_WAIT_SET.contains(&sm_state);
        let stalled = dma_completions == self.prev_dma_completions
            && dma_completions > 0
            && progressing_state;

        if stalled {
            self.consecutive_stall_polls = self.consecutive_stall_polls.saturating_add(1);
        } else {
            self.consecutive_stall_polls = 0;
            self.prev_dma_completions = dma_completions;
        }

        self.consecutive_stall_polls >= WATCHDOG_STALL_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUSY: u8 = BUSY_OR_WAIT_SET[0];
    const NOT_BUSY: u8 = 0;

    #[test]
    fn no_progress_below_threshold_does_not_trip() {
        let mut wd = StallWatchdog::new();
        assert!(!wd.observe(10, BUSY));
        assert!(!wd.observe(10, BUSY));
        assert!(!wd.observe(10, BUSY));
    }

    #[test]
    fn three_consecutive_stalls_trip_recovery() {
        let mut wd = StallWatchdog::new();
        wd.observe(10, BUSY);
        assert!(!wd.observe(10, BUSY));
        assert!(!wd.observe(10, BUSY));
        assert!(wd.observe(10, BUSY));
    }

    #[test]
    fn progress_resets_the_stall_counter() {
        let mut wd = StallWatchdog::new();
        wd.observe(10, BUSY);
        wd.observe(10, BUSY);
        assert!(!wd.observe(11, BUSY));
        assert!(!wd.observe(11, BUSY));
    }

    #[test]
    fn zero_completions_never_counts_as_stalled() {
        let mut wd = StallWatchdog::new();
        for _ in 0..10 {
            assert!(!wd.observe(0, BUSY));
        }
    }

    #[test]
    fn leaving_the_busy_or_wait_set_clears_the_stall_counter() {
        let mut wd = StallWatchdog::new();
        wd.observe(10, BUSY);
        wd.observe(10, BUSY);
        assert!(!wd.observe(10, NOT_BUSY));
        assert!(!wd.observe(10, BUSY));
    }

    #[test]
    fn reset_clears_history() {
        let mut wd = StallWatchdog::new();
        wd.observe(10, BUSY);
        wd.observe(10, BUSY);
        wd.reset();
        assert!(!wd.observe(10, BUSY));
    }
}
