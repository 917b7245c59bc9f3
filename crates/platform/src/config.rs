//! Build-time configuration constants.
//!
//! All ring/queue capacities, cadences, and the PIB BUSY/WAIT set live here
//! as plain `pub const` items rather than scattered literals. There is no
//! runtime configuration file — the device is RAM-resident with no
//! persisted state (power cycle returns to these defaults).

/// Firmware version reported by INFO/TEST.
pub const FIRMWARE_VER_MAJOR: u8 = 2;
/// Firmware version reported by INFO/TEST.
pub const FIRMWARE_VER_MINOR: u8 = 2;

/// Maximum length of an EP0 data phase this device will service.
pub const EP0_SCRATCH_LEN: usize = 64;

/// Console transmit ring capacity, bytes.
pub const CONSOLE_TX_RING_LEN: usize = 100;
/// Console receive line-accumulator capacity, bytes.
pub const CONSOLE_RX_LINE_LEN: usize = 32;

/// Event queue depth (tagged 32-bit words).
pub const EVENT_QUEUE_LEN: usize = 16;

/// Number of producer buffers in the DMA ring (ping/pong plus headroom).
pub const DMA_BUFFER_COUNT: usize = 4;
/// Size of a single DMA producer buffer, bytes.
pub const DMA_BUFFER_SIZE: usize = 16 * 1024;

/// Watchdog poll cadence while a session is `Streaming`.
pub const WATCHDOG_POLL_MS: u64 = 100;
/// Consecutive stalled polls before watchdog recovery fires (≈ 300 ms).
pub const WATCHDOG_STALL_THRESHOLD: u8 = 3;

/// Hard cap on PLL-lock poll iterations after SET_ADC (1 ms each, ≈ 100 ms).
pub const PLL_LOCK_POLL_ITERATIONS: u32 = 100;
/// Interval between PLL-lock polls.
pub const PLL_LOCK_POLL_INTERVAL_MS: u64 = 1;

/// Quiesce sleep inside `stop()` to let the DMA controller settle.
pub const STOP_QUIESCE_MS: u64 = 1;

/// Delay after acking a `RESET` vendor request, before the hardware reset
/// actually fires — gives the status-stage ACK time to reach the host.
pub const RESET_DELAY_MS: u64 = 100;

/// PIB state-machine codes denoting "waiting for downstream drain" — the
/// only states in which a no-progress condition is diagnostic of a wedge.
///
/// Named configuration, not magic numbers: this is the reference waveform's
/// concrete busy/wait set, re-exported so the watchdog never hard-codes it.
pub const BUSY_OR_WAIT_SET: &[u8] = &[5, 7, 8, 9];

/// Sentinel PIB state meaning "force-stopped".
pub const PIB_STATE_DISABLED: u8 = 255;

/// Si5351 crystal reference frequency.
pub const SI5351_CRYSTAL_HZ: u32 = 27_000_000;
