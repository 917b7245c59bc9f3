//! EP0 vendor request dispatch: decodes the control SETUP packet and
//! the vendor/`SET_ARG` code tables, and carries out every vendor request
//! against the streaming supervisor and the platform adapters.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod dispatcher;
mod request;
mod setup;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use request::{SetArgId, VendorRequest};
pub use setup::SetupPacket;
