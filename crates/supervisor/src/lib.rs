//! Streaming supervisor: the DMA ring / PIB state machine lifecycle,
//! preflight gating, and watchdog-driven stall recovery.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod completion;
mod state;
mod watchdog;

#[allow(clippy::module_inception)]
mod supervisor;

pub use completion::CompletionCounter;
pub use state::SessionState;
pub use supervisor::{StartError, Supervisor, WatchdogOutcome};
pub use watchdog::StallWatchdog;
