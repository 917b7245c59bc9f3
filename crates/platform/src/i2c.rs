//! I²C transfer helper abstraction.
//!
//! Deliberately synchronous and narrow: register-addressed byte transfers
//! only, the shape the clock controller and the EP0 I2C_READ/I2C_WRITE
//! commands actually need. SPI/UART are out of scope for this board.

/// Synchronous register-addressed I²C transfer.
pub trait I2c {
    /// Error type. Implementations should distinguish at minimum a NACK
    /// from a bus-level failure, but the core only ever treats any error
    /// as "transfer failed" and counts it.
    type Error: core::fmt::Debug;

    /// Transfer `buf.len()` bytes at register `reg` on device `addr`.
    /// `is_read = true` reads the device into `buf`; `false` writes `buf`
    /// to the device.
    fn transfer(
        &mut self,
        addr: u8,
        reg: u8,
        buf: &mut [u8],
        is_read: bool,
    ) -> Result<(), Self::Error>;
}

/// Adapts any `embedded_hal::i2c::I2c` bus into the narrower [`I2c`]
/// contract above, performing the register-address write-then-transfer
/// dance a caller would otherwise have to repeat at every call site.
pub struct EmbeddedHalI2c<T> {
    bus: T,
}

impl<T> EmbeddedHalI2c<T> {
    /// Wrap an `embedded-hal` I²C bus.
    pub fn new(bus: T) -> Self {
        Self { bus }
    }

    /// Unwrap back to the underlying bus.
    pub fn into_inner(self) -> T {
        self.bus
    }
}

impl<T> I2c for EmbeddedHalI2c<T>
where
    T: embedded_hal::i2c::I2c,
{
    type Error = T::Error;

    fn transfer(
        &mut self,
        addr: u8,
        reg: u8,
        buf: &mut [u8],
        is_read: bool,
    ) -> Result<(), Self::Error> {
        if is_read {
            self.bus.write_read(addr, &[reg], buf)
        } else {
            // Register address followed by payload, as one STOP-free
            // transaction; buf is small (EP0-scratch-bounded) so a stack
            // staging array is fine here.
            let mut staged = [0u8; 1 + crate::config::EP0_SCRATCH_LEN];
            let n = buf.len().min(crate::config::EP0_SCRATCH_LEN);
            staged[0] = reg;
            staged[1..=n].copy_from_slice(&buf[..n]);
            self.bus.write(addr, &staged[..=n])
        }
    }
}
