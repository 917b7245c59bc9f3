//! Clock controller: Si5351 PLL/MultiSynth programming and lock
//! reporting for the ADC sample clock.
//!
//! Split into pure arithmetic ([`si5351`]) and the stateful I²C-driving
//! controller ([`controller`]) so the numerics are property-testable
//! without any I²C fixture.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod si5351;

pub use controller::{ClockController, ClockError};
