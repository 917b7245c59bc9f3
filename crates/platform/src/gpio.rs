//! GPIO abstraction.
//!
//! The front end exposes a handful of board-specific output lines
//! (attenuator latch/clock/data, shutdown, dither, bias, LED, VHF enable,
//! PGA enable) addressed generically by a small
//! integer id, not through a per-pin Rust type. The core only ever asks
//! "set this id to this value" or "configure this id this way"; bit
//! semantics of the GPIOFX3 command word are a dispatcher-level concern.

/// Pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Floating or pulled input.
    Input,
    /// Push-pull output.
    Output,
}

/// Pull resistor configuration, meaningful only for [`Direction::Input`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// No pull resistor.
    None,
    /// Internal pull-up.
    Up,
    /// Internal pull-down.
    Down,
}

/// Logical pin state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    /// High (logic 1).
    High,
    /// Low (logic 0).
    Low,
}

impl From<bool> for PinState {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<PinState> for bool {
    fn from(value: PinState) -> Self {
        matches!(value, PinState::High)
    }
}

/// Narrow GPIO contract: configure a pin's direction/pull once at
/// boot, then drive or sense it by id.
pub trait Gpio {
    /// Error type.
    type Error: core::fmt::Debug;

    /// One-time direction/pull configuration for a pin id.
    fn configure(&mut self, id: u8, dir: Direction, pull: Pull) -> Result<(), Self::Error>;

    /// Drive an output pin.
    fn set_pin(&mut self, id: u8, value: bool) -> Result<(), Self::Error>;

    /// Sense an input pin.
    fn get_pin(&self, id: u8) -> Result<bool, Self::Error>;
}
