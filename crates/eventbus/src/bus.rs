//! The event queue: a single bounded MPSC channel of tagged
//! 32-bit words shared by every producer context (DMA completion, PIB error
//! callback, EP0 dispatch, console line accumulator) and drained by one
//! application task.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};

use crate::event::Event;

/// Queue depth ([`platform::config::EVENT_QUEUE_LEN`]).
pub const CAPACITY: usize = platform::config::EVENT_QUEUE_LEN;

/// The event queue. A `'static` instance is shared between tasks as a
/// `Sender`/`Receiver` pair obtained from [`EventBus::split`], matching how
/// the other Embassy channels in this firmware are handed out (never the
/// `Channel` itself, to keep the send/receive capabilities separate).
pub struct EventBus {
    channel: Channel<CriticalSectionRawMutex, u32, CAPACITY>,
    dropped: AtomicU32,
}

impl EventBus {
    /// An empty queue. Intended for a `static` binding; construct once at
    /// startup and [`Self::split`] into a sender/receiver pair.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Split into a cheap-to-clone sender and the single receiver.
    pub fn split(&self) -> (EventSender<'_>, EventReceiver<'_>) {
        (
            EventSender {
                sender: self.channel.sender(),
                dropped: &self.dropped,
            },
            EventReceiver {
                receiver: self.channel.receiver(),
            },
        )
    }

    /// Total events dropped across every producer since construction,
    /// because the queue was full when [`EventSender::try_post`] was
    /// called. Diagnostic only — not part of the `STATS` wire payload
    /// (§6), since it has no reserved offset there.
    #[must_use]
    pub fn dropped_events(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle producers use to post events. Cloneable; every producer context
/// (interrupt, async task) holds its own copy.
#[derive(Clone, Copy)]
pub struct EventSender<'a> {
    sender: Sender<'a, CriticalSectionRawMutex, u32, CAPACITY>,
    dropped: &'a AtomicU32,
}

impl EventSender<'_> {
    /// Post an event without blocking. Producers never wait on queue space:
    /// a full queue means the consumer has fallen critically behind, and
    /// dropping the newest event is preferable to stalling a
    /// DMA-completion or PIB-error context. A dropped event still counts
    /// toward [`EventBus::dropped_events`], so backpressure is at least
    /// observable even though the event itself is gone.
    ///
    /// Returns `false` if the queue was full and the event was dropped.
    pub fn try_post(&self, event: Event) -> bool {
        match self.sender.try_send(event.encode()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }
}

/// The single consumer handle, held by the application task.
pub struct EventReceiver<'a> {
    receiver: Receiver<'a, CriticalSectionRawMutex, u32, CAPACITY>,
}

impl EventReceiver<'_> {
    /// Await the next event.
    pub async fn recv(&mut self) -> Event {
        Event::decode(self.receiver.receive().await)
    }

    /// Take the next event if one is already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_receive().ok().map(Event::decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_then_receive_round_trips() {
        let bus = EventBus::new();
        let (tx, mut rx) = bus.split();
        assert!(tx.try_post(Event::PibError(9)));
        assert_eq!(rx.try_recv(), Some(Event::PibError(9)));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn full_queue_drops_the_newest_event_without_blocking() {
        let bus = EventBus::new();
        let (tx, mut rx) = bus.split();
        for _ in 0..CAPACITY {
            assert!(tx.try_post(Event::UserCommand));
        }
        assert!(!tx.try_post(Event::UserCommand));
        assert_eq!(bus.dropped_events(), 1);

        let mut drained = 0;
        while rx.try_recv().is_some() {
            drained += 1;
        }
        assert_eq!(drained, CAPACITY);
    }

    #[test]
    fn dropped_events_accumulates_across_every_overflow() {
        let bus = EventBus::new();
        let (tx, _rx) = bus.split();
        for _ in 0..CAPACITY {
            assert!(tx.try_post(Event::UserCommand));
        }
        assert!(!tx.try_post(Event::UserCommand));
        assert!(!tx.try_post(Event::UserCommand));
        assert!(!tx.try_post(Event::UserCommand));
        assert_eq!(bus.dropped_events(), 3);
    }

    #[tokio::test]
    async fn recv_awaits_a_later_post() {
        let bus = EventBus::new();
        let (tx, mut rx) = bus.split();
        assert!(tx.try_post(Event::Usb(42)));
        assert_eq!(rx.recv().await, Event::Usb(42));
    }
}
