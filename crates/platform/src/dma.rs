//! DMA ring abstraction.
//!
//! Models the AUTO_MANY_TO_ONE descriptor set described in the data model:
//! two producer sockets (ping/pong, fed by the parallel interface) and one
//! consumer socket (the bulk endpoint), with a fixed buffer count/size
//! chosen at build time. Structural memory is owned by the implementor;
//! lifetime is bound to a streaming session.

/// Ring geometry, chosen at build time (see [`crate::config`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaRingConfig {
    /// Number of producer buffers (ping/pong plus any headroom).
    pub buffer_count: usize,
    /// Size of each producer buffer, bytes.
    pub buffer_size: usize,
}

impl DmaRingConfig {
    /// Ring geometry from [`crate::config`]'s build-time constants.
    pub const fn from_build_config() -> Self {
        Self {
            buffer_count: crate::config::DMA_BUFFER_COUNT,
            buffer_size: crate::config::DMA_BUFFER_SIZE,
        }
    }
}

/// The many-to-one DMA ring contract.
///
/// A producer buffer commit MUST invoke exactly one
/// [`DmaCompletionSink::on_producer_committed`] call; the supervisor counts
/// on this for its watchdog accounting. This adapter never owns the
/// completion counter itself — it is handed a sink at construction so the
/// increment happens directly in the completion-interrupt context with no
/// other work, matching the single execution context it runs in.
pub trait Dma {
    /// Error type for ring configuration failures.
    type Error: core::fmt::Debug;

    /// (Re)configure the ring's descriptor set. Valid only while the ring
    /// is not actively transferring.
    fn configure(&mut self, ring: DmaRingConfig) -> Result<(), Self::Error>;

    /// Tear down any in-flight transfer and return descriptors to the pool.
    /// Idempotent: calling `reset` on an already-reset ring is a no-op.
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// Arm an infinite transfer (no byte-count limit; runs until `reset`).
    fn set_infinite_transfer(&mut self) -> Result<(), Self::Error>;

    /// Release the ring's descriptor set entirely. The reference adapter
    /// keeps the ring allocated across sessions and treats this as a
    /// deeper `reset`; implementations that free memory here may.
    fn destroy(&mut self) -> Result<(), Self::Error>;
}

/// Receives the one-increment-per-committed-buffer notification from the
/// DMA completion interrupt context. Implementations MUST do nothing more
/// than increment a counter — no logging, no queue sends — this runs at
/// the highest rate in the system.
pub trait DmaCompletionSink {
    /// Called exactly once per committed producer buffer.
    fn on_producer_committed(&self);
}

impl<T: DmaCompletionSink + ?Sized> DmaCompletionSink for &T {
    fn on_producer_committed(&self) {
        (**self).on_producer_committed();
    }
}

/// Circular byte buffer backing the console transmit/receive rings.
///
/// `N` bytes of storage yield `N - 1` usable bytes (the classic
/// full/empty-disambiguating ring invariant).
pub struct CircularBuffer<const N: usize> {
    buffer: [u8; N],
    write_pos: usize,
    read_pos: usize,
}

impl<const N: usize> Default for CircularBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> CircularBuffer<N> {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            write_pos: 0,
            read_pos: 0,
        }
    }

    /// Bytes currently available to read.
    pub fn available(&self) -> usize {
        if self.write_pos >= self.read_pos {
            self.write_pos - self.read_pos
        } else {
            N - self.read_pos + self.write_pos
        }
    }

    /// Bytes of free space remaining.
    pub fn free_space(&self) -> usize {
        N - self.available() - 1
    }

    /// Write as much of `data` as fits; returns the number of bytes written.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let free = self.free_space();
        let to_write = data.len().min(free);

        for &byte in &data[..to_write] {
            self.buffer[self.write_pos] = byte;
            self.write_pos = (self.write_pos + 1) % N;
        }

        to_write
    }

    /// Read into `buffer`, draining what was read; returns bytes read.
    pub fn read(&mut self, buffer: &mut [u8]) -> usize {
        let available = self.available();
        let to_read = buffer.len().min(available);

        for slot in buffer.iter_mut().take(to_read) {
            *slot = self.buffer[self.read_pos];
            self.read_pos = (self.read_pos + 1) % N;
        }

        to_read
    }

    /// Peek at up to `out.len()` pending bytes without draining them.
    /// Returns the number of bytes copied.
    ///
    /// The DEBUG_IO drain must copy-then-memmove under a single
    /// critical section rather than two separately locked operations;
    /// `peek` + [`Self::consume`] lets the caller bracket both in one.
    pub fn peek(&self, out: &mut [u8]) -> usize {
        let to_copy = self.available().min(out.len());
        let mut pos = self.read_pos;
        for slot in out.iter_mut().take(to_copy) {
            *slot = self.buffer[pos];
            pos = (pos + 1) % N;
        }
        to_copy
    }

    /// Advance the read cursor by `n` bytes (releasing them), without
    /// copying — pairs with [`Self::peek`].
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.available());
        self.read_pos = (self.read_pos + n) % N;
    }

    /// True when no bytes are pending.
    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }
}
