//! Bulk endpoint abstraction.
//!
//! One USB SuperSpeed IN endpoint carrying little-endian 16-bit signed ADC
//! samples in raw stream form — no framing, no headers. The core never
//! touches packet data directly; it only configures burst geometry and
//! recovers the endpoint from stall/flush conditions.

/// The bulk endpoint contract.
pub trait BulkEndpoint {
    /// Error type for endpoint configuration failures.
    type Error: core::fmt::Debug;

    /// Configure burst length (packets per burst) and max packet size.
    /// Called once at session start, before the DMA ring is armed.
    fn configure(&mut self, burst_len: u8, packet_size: u16) -> Result<(), Self::Error>;

    /// Discard any buffered/in-flight descriptors. Called on every
    /// `start()`/`stop()`/recovery transition to drop stale data rather
    /// than let it leak into the next session.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Clear a host-issued `CLEAR_FEATURE(ENDPOINT_HALT)`.
    ///
    /// `reset_toggle = true` additionally resets the data toggle bit so
    /// host and device agree on the next expected sequence. The supervisor
    /// calls this in isolation — **never** combined with [`Self::flush`] or
    /// a DMA reset in the same operation, since that would desynchronize
    /// the toggle the host just cleared and silently kill the bulk stream.
    fn clear_halt(&mut self, reset_toggle: bool) -> Result<(), Self::Error>;
}
