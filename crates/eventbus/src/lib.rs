//! Event bus and diagnostics: the queue that carries USB, vendor-trace,
//! PIB-error, and console events from their producer contexts to the
//! application task, plus the counters and console rings that back the
//! `STATS` and `DEBUG_IO` vendor requests.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod console;
pub mod event;
pub mod pib_latch;
pub mod stats;

pub use bus::{EventBus, EventReceiver, EventSender};
pub use console::{ConsoleRx, ConsoleTx};
pub use event::Event;
pub use pib_latch::{PibErrorLatch, PibErrorNotifier};
pub use stats::StatsCounters;
