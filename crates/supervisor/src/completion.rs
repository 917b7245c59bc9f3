//! DMA completion counter.
//!
//! The single writer is the DMA completion interrupt; the watchdog poll is
//! the only reader, and only ever compares for equality, so a relaxed
//! atomic is enough — there is no ordering to preserve between this and any
//! other memory the interrupt touches, because it touches nothing else.

use core::sync::atomic::{AtomicU32, Ordering};

use platform::DmaCompletionSink;

/// Counts committed DMA producer buffers for one streaming session.
#[derive(Default)]
pub struct CompletionCounter {
    count: AtomicU32,
}

impl CompletionCounter {
    /// A counter starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Current completion count.
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Clear to zero, at session start/stop or a successful recovery.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}

impl DmaCompletionSink for CompletionCounter {
    fn on_producer_committed(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_and_increments_per_call() {
        let counter = CompletionCounter::new();
        assert_eq!(counter.count(), 0);
        counter.on_producer_committed();
        counter.on_producer_committed();
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn reset_returns_to_zero() {
        let counter = CompletionCounter::new();
        counter.on_producer_committed();
        counter.reset();
        assert_eq!(counter.count(), 0);
    }
}
