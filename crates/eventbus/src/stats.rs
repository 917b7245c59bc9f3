//! The `STATS` vendor-request payload: a 20-byte little-endian
//! snapshot of counters the host can poll without interrupting streaming.

/// Wire length of the encoded counters block, in bytes.
pub const WIRE_LEN: usize = 20;

/// Diagnostic counters reported over the `STATS` vendor request.
///
/// Every field is a plain counter or cached status byte; none of them are
/// authoritative state — they exist purely for host-side observability, so
/// widening or saturating on overflow is always preferable to erroring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsCounters {
    /// Completed DMA producer buffers since the last start (or stop).
    pub dma_completions: u32,
    /// The PIB hardware state-machine's current state byte.
    pub pib_sm_state: u8,
    /// Total PIB error callbacks observed since boot.
    pub pib_error_count: u32,
    /// The 16-bit argument from the most recent PIB error, 0 if none yet.
    pub last_pib_error_arg: u16,
    /// Total I²C transfer failures observed since boot (clock chip bus).
    pub i2c_failure_count: u32,
    /// Total streaming faults (recovery attempts that did not clear).
    pub streaming_fault_count: u32,
    /// Cached clock-chip status register byte.
    pub clock_chip_status: u8,
}

impl StatsCounters {
    /// Encode into the fixed 20-byte little-endian wire layout.
    #[must_use]
    pub fn to_wire(self) -> [u8; WIRE_LEN] {
        let mut buf = [0u8; WIRE_LEN];
        buf[0..4].copy_from_slice(&self.dma_completions.to_le_bytes());
        buf[4] = self.pib_sm_state;
        buf[5..9].copy_from_slice(&self.pib_error_count.to_le_bytes());
        buf[9..11].copy_from_slice(&self.last_pib_error_arg.to_le_bytes());
        buf[11..15].copy_from_slice(&self.i2c_failure_count.to_le_bytes());
        buf[15..19].copy_from_slice(&self.streaming_fault_count.to_le_bytes());
        buf[19] = self.clock_chip_status;
        buf
    }
}
