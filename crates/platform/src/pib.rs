//! Parallel interface block (PIB/GPIF) abstraction.
//!
//! The PIB is a hardware FSM clocked by the external ADC clock, not by the
//! CPU — it has no state-count timeout. Starting it without a running clock
//! wedges it permanently in a read state; only [`Pib::disable`] with
//! `force = true` recovers it. This is why every `start()` path in the
//! supervisor gates on the clock controller's lock status first (preflight).

/// Sentinel PIB state meaning "force-stopped" (not a real transport state).
pub const STATE_DISABLED: u8 = crate::config::PIB_STATE_DISABLED;

/// The PIB hardware state machine contract.
///
/// `load_waveform` and `start` are only meaningful from a disabled SM; the
/// supervisor always calls `disable(force: true)` before reloading, so
/// implementations need not defend against being asked to reload a running
/// SM.
pub trait Pib {
    /// Error type for PIB configuration/control failures.
    type Error: core::fmt::Debug;

    /// Load the transport waveform (the compiled GPIF state program) into
    /// the SM. Must be called with the SM disabled.
    fn load_waveform(&mut self, waveform: &[u8]) -> Result<(), Self::Error>;

    /// Start the SM at the given initial state (always `0` per the
    /// supervisor's contract, but left as a parameter for the reference
    /// driver's shape).
    fn start(&mut self, state: u8) -> Result<(), Self::Error>;

    /// Force-stop the SM. `force = true` is the only form the supervisor
    /// ever uses: a graceful stop would wait for the ADC clock to retire
    /// the current state, which may never happen if the clock has already
    /// been disabled.
    fn disable(&mut self, force: bool) -> Result<(), Self::Error>;

    /// Assert or de-assert the firmware-side trigger line that starts the
    /// transport state machine's data flow.
    fn set_sw_trigger(&mut self, asserted: bool) -> Result<(), Self::Error>;

    /// Current SM state code. [`STATE_DISABLED`] (255) when force-stopped.
    fn sm_state(&self) -> u8;
}

/// Receives the one-shot PIB error notification from interrupt context.
/// Implementations MUST do nothing more than record the argument
/// and set a latch — no queue sends, no allocation — mirroring
/// [`crate::dma::DmaCompletionSink`]'s "narrow mutation handle" contract.
pub trait PibErrorSink {
    /// Called from the PIB error interrupt with the device-reported 16-bit
    /// error argument.
    fn on_pib_error(&self, arg: u16);
}
