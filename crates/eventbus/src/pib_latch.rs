//! One-shot PIB error latch.
//!
//! The PIB hardware can raise errors far faster than the event queue can
//! drain them under backpressure; a latch that remembers only "at least one
//! error is pending, with this most-recent argument" keeps the watchdog
//! task's error check O(1) regardless of how bursty the hardware is, and
//! guarantees a slow consumer never starves on a flood of near-duplicate
//! reports.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

use crate::bus::EventSender;
use crate::event::Event;

/// Interior-mutability latch safe to share behind a `&` reference across
/// an interrupt context and the application task.
pub struct PibErrorLatch {
    pending: AtomicBool,
    last_arg: AtomicU16,
    total: AtomicU32,
}

impl PibErrorLatch {
    /// A latch with nothing pending.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            last_arg: AtomicU16::new(0),
            total: AtomicU32::new(0),
        }
    }

    /// Record an error. Safe to call from an interrupt context; never
    /// blocks, never allocates. Returns `true` the first time this latches
    /// a pending error (pending transitions `false` -> `true`) and `false`
    /// on every subsequent call until [`Self::take`] clears it again — the
    /// signal a caller needs to enqueue at most one event per pending error,
    /// however many hardware reports arrive while it sits unconsumed.
    #[must_use]
    pub fn set(&self, arg: u16) -> bool {
        self.last_arg.store(arg, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
        !self.pending.swap(true, Ordering::AcqRel)
    }

    /// Total error callbacks observed since construction, independent of
    /// how many have been [`Self::take`]n — the `STATS` `pib_error_count`
    /// field, which must never regress on a read.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.total.load(Ordering::Relaxed)
    }

    /// Peek the most recent error argument without clearing the pending
    /// flag — the `STATS` `last_pib_error_arg` field is a cached snapshot,
    /// not a one-shot consumable like [`Self::take`].
    #[must_use]
    pub fn last_arg(&self) -> u16 {
        self.last_arg.load(Ordering::Relaxed)
    }

    /// Take the pending error, if any, clearing the latch. Returns the
    /// argument from the most recent [`Self::set`] call observed, which may
    /// have coalesced several hardware reports into one.
    pub fn take(&self) -> Option<u16> {
        if self.pending.swap(false, Ordering::AcqRel) {
            Some(self.last_arg.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    /// Zero every counter, including [`Self::total`]. The one exception to
    /// "total never regresses": a re-enumeration event starts a fresh
    /// session, and the reference firmware's diagnostic counters reset
    /// with it.
    pub fn reset(&self) {
        self.pending.store(false, Ordering::Release);
        self.last_arg.store(0, Ordering::Relaxed);
        self.total.store(0, Ordering::Relaxed);
    }
}

impl Default for PibErrorLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Binds a [`PibErrorLatch`] to the event queue: the
/// [`platform::PibErrorSink`] the PIB error interrupt context actually
/// calls. `on_pib_error` always updates the latch (so `STATS`' error count
/// and last-argument fields stay current under any burst rate), but only
/// posts an [`Event::PibError`] the first time the latch transitions from
/// idle to pending — every subsequent hardware report before the
/// application task processes that event updates the latch silently
/// without growing the queue.
pub struct PibErrorNotifier<'a> {
    latch: &'static PibErrorLatch,
    events: EventSender<'a>,
}

impl<'a> PibErrorNotifier<'a> {
    /// Bind a latch and an event-queue sender.
    #[must_use]
    pub fn new(latch: &'static PibErrorLatch, events: EventSender<'a>) -> Self {
        Self { latch, events }
    }
}

impl platform::PibErrorSink for PibErrorNotifier<'_> {
    fn on_pib_error(&self, arg: u16) {
        if self.latch.set(arg) {
            self.events.try_post(Event::PibError(arg));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_latch_takes_nothing() {
        let latch = PibErrorLatch::new();
        assert_eq!(latch.take(), None);
    }

    #[test]
    fn take_clears_the_latch() {
        let latch = PibErrorLatch::new();
        latch.set(7);
        assert_eq!(latch.take(), Some(7));
        assert_eq!(latch.take(), None);
    }

    #[test]
    fn repeated_sets_before_a_take_coalesce_to_the_latest_arg() {
        let latch = PibErrorLatch::new();
        latch.set(1);
        latch.set(2);
        latch.set(3);
        assert_eq!(latch.take(), Some(3));
    }

    #[test]
    fn last_arg_survives_a_take() {
        let latch = PibErrorLatch::new();
        latch.set(42);
        assert_eq!(latch.take(), Some(42));
        assert_eq!(latch.last_arg(), 42);
    }

    #[test]
    fn total_counts_every_set_regardless_of_take() {
        let latch = PibErrorLatch::new();
        latch.set(1);
        latch.set(2);
        assert_eq!(latch.total(), 2);
        latch.take();
        latch.set(3);
        assert_eq!(latch.total(), 3);
    }

    #[test]
    fn reset_zeroes_every_field() {
        let latch = PibErrorLatch::new();
        latch.set(9);
        latch.reset();
        assert_eq!(latch.total(), 0);
        assert_eq!(latch.last_arg(), 0);
        assert_eq!(latch.take(), None);
    }

    #[test]
    fn set_reports_newly_latched_only_on_the_false_to_true_transition() {
        let latch = PibErrorLatch::new();
        assert!(latch.set(1));
        assert!(!latch.set(2));
        assert!(!latch.set(3));
        assert_eq!(latch.take(), Some(3));
        assert!(latch.set(4));
    }

    #[test]
    fn notifier_posts_at_most_one_event_per_pending_error() {
        use crate::bus::EventBus;
        use platform::PibErrorSink;

        static LATCH: PibErrorLatch = PibErrorLatch::new();
        let bus = EventBus::new();
        let (tx, mut rx) = bus.split();
        let notifier = PibErrorNotifier::new(&LATCH, tx);

        notifier.on_pib_error(5);
        notifier.on_pib_error(6);
        notifier.on_pib_error(7);

        assert_eq!(rx.try_recv(), Some(Event::PibError(5)));
        assert_eq!(rx.try_recv(), None);
        assert_eq!(LATCH.total(), 3);
        assert_eq!(LATCH.last_arg(), 7);

        assert_eq!(LATCH.take(), Some(7));
        notifier.on_pib_error(8);
        assert_eq!(rx.try_recv(), Some(Event::PibError(8)));
    }
}
