//! Debug console transmit ring and receive line accumulator.
//!
//! Both directions are backed by [`platform::CircularBuffer`]. Capacities
//! are `config::CONSOLE_*_LEN + 1` (the ring's usable capacity is always one
//! less than its storage) — spelled out as their own constants rather than
//! a `{ N + 1 }` const-generic expression, to keep the instantiation trivial
//! to read.

use platform::CircularBuffer;

/// Backing storage for [`ConsoleTx`]; one more than the usable capacity.
pub const TX_CAPACITY: usize = platform::config::CONSOLE_TX_RING_LEN + 1;
/// Backing storage for [`ConsoleRx`]; one more than the usable capacity.
pub const RX_CAPACITY: usize = platform::config::CONSOLE_RX_LINE_LEN + 1;

/// Outbound debug text queued for the next `DEBUG_IO` vendor request poll.
pub struct ConsoleTx {
    ring: CircularBuffer<TX_CAPACITY>,
}

impl ConsoleTx {
    /// An empty transmit ring.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: CircularBuffer::new(),
        }
    }

    /// Queue as much of `data` as fits; returns the number of bytes queued.
    /// Silently drops the remainder — this is a best-effort diagnostic
    /// channel, never one the control plane blocks on.
    pub fn queue(&mut self, data: &[u8]) -> usize {
        self.ring.write(data)
    }

    /// Copy pending bytes into `out` and release exactly that many from the
    /// ring. Returns the number of bytes copied, which may be less than
    /// `out.len()` or zero.
    ///
    /// Earlier firmware unconditionally zeroed the ring's length on every
    /// `DEBUG_IO` poll, discarding unsent bytes whenever the host's read
    /// buffer was smaller than the pending backlog. This only ever releases
    /// what was actually copied out.
    pub fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let copied = self.ring.peek(out);
        self.ring.consume(copied);
        copied
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl Default for ConsoleTx {
    fn default() -> Self {
        Self::new()
    }
}

/// Inbound console line accumulator. Bytes arrive one at a time from the
/// `DEBUG_IO` vendor request's OUT stage; a line is complete at `\n` (or
/// once the line fills, to bound worst-case memory regardless of host
/// behavior).
pub struct ConsoleRx {
    ring: CircularBuffer<RX_CAPACITY>,
    line_ready: bool,
}

impl ConsoleRx {
    /// An empty receive accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: CircularBuffer::new(),
            line_ready: false,
        }
    }

    /// Feed one byte from the host. Returns `true` if this byte completed a
    /// line (either by newline or by filling the buffer) — the caller
    /// should post [`crate::event::Event::UserCommand`] exactly once per
    /// `true` return.
    pub fn push_byte(&mut self, byte: u8) -> bool {
        if self.line_ready {
            // Previous line hasn't been taken yet; drop input rather than
            // silently overwrite a line the app task hasn't read.
            return false;
        }
        self.ring.write(&[byte]);
        let full = self.ring.free_space() == 0;
        if byte == b'\n' || full {
            self.line_ready = true;
            return true;
        }
        false
    }

    /// Copy the accumulated line into `out` and reset the accumulator for
    /// the next one. Returns the number of bytes copied.
    pub fn take_line(&mut self, out: &mut [u8]) -> usize {
        let n = self.ring.read(out);
        self.line_ready = false;
        n
    }

    /// True once a complete line is waiting for [`Self::take_line`].
    #[must_use]
    pub fn line_ready(&self) -> bool {
        self.line_ready
    }
}

impl Default for ConsoleRx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_drain_releases_only_what_was_copied() {
        let mut tx = ConsoleTx::new();
        tx.queue(b"hello world");
        let mut small = [0u8; 4];
        assert_eq!(tx.drain_into(&mut small), 4);
        assert_eq!(&small, b"hell");
        assert!(!tx.is_empty());

        let mut rest = [0u8; 16];
        let n = tx.drain_into(&mut rest);
        assert_eq!(&rest[..n], b"o world");
        assert!(tx.is_empty());
    }

    #[test]
    fn tx_short_read_does_not_drop_unsent_bytes() {
        let mut tx = ConsoleTx::new();
        tx.queue(b"abc");
        let mut out = [0u8; 0];
        assert_eq!(tx.drain_into(&mut out), 0);
        assert!(!tx.is_empty());
    }

    #[test]
    fn rx_completes_a_line_on_newline() {
        let mut rx = ConsoleRx::new();
        for &b in b"go\n" {
            let ready = rx.push_byte(b);
            assert_eq!(ready, b == b'\n');
        }
        assert!(rx.line_ready());
        let mut out = [0u8; 8];
        let n = rx.take_line(&mut out);
        assert_eq!(&out[..n], b"go\n");
        assert!(!rx.line_ready());
    }

    #[test]
    fn rx_drops_bytes_while_a_line_is_pending() {
        let mut rx = ConsoleRx::new();
        rx.push_byte(b'a');
        rx.push_byte(b'\n');
        assert!(rx.line_ready());
        assert!(!rx.push_byte(b'b'));
        let mut out = [0u8; 8];
        let n = rx.take_line(&mut out);
        assert_eq!(&out[..n], b"a\n");
    }

    #[test]
    fn rx_force_completes_when_the_buffer_fills() {
        let mut rx = ConsoleRx::new();
        let mut ready_at = None;
        for i in 0..platform::config::CONSOLE_RX_LINE_LEN {
            if rx.push_byte(b'x') {
                ready_at = Some(i);
                break;
            }
        }
        assert_eq!(ready_at, Some(platform::config::CONSOLE_RX_LINE_LEN - 1));
    }
}
