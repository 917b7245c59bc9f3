//! Mock implementations of the platform traits for host-side tests.
//!
//! These are deliberately simple record-and-replay fakes, not behavioral
//! simulations of the silicon: each mock tracks the calls it received and
//! lets a test inject the next failure, which is all the control-plane
//! tests above this layer need.

#![cfg(any(test, feature = "std"))]

use crate::bulk::BulkEndpoint;
use crate::dma::{Dma, DmaCompletionSink, DmaRingConfig};
use crate::gpio::{Direction, Gpio, Pull};
use crate::i2c::I2c;
use crate::pib::Pib;
use crate::system::SystemControl;
use core::cell::Cell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Generic failure marker returned by every mock when a test arms it to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// Mock DMA ring.
///
/// Holds the completion sink directly (matching the real contract: the ring
/// is handed a sink at construction and invokes it from "interrupt"
/// context). Tests drive completions explicitly via
/// [`MockDma::commit_producer_buffer`] rather than a background thread.
pub struct MockDma<S> {
    sink: S,
    configured: Option<DmaRingConfig>,
    infinite_transfer_armed: bool,
    reset_count: u32,
    destroyed: bool,
    fail_next: Cell<bool>,
}

impl<S: DmaCompletionSink> MockDma<S> {
    /// Wrap a completion sink in a fresh, unconfigured mock ring.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            configured: None,
            infinite_transfer_armed: false,
            reset_count: 0,
            destroyed: false,
            fail_next: Cell::new(false),
        }
    }

    /// Arm the next fallible call to fail.
    pub fn fail_next_call(&self) {
        self.fail_next.set(true);
    }

    /// Simulate one committed producer buffer, invoking the sink exactly
    /// once as the real ring's interrupt context would.
    pub fn commit_producer_buffer(&self) {
        self.sink.on_producer_committed();
    }

    /// Number of times [`Dma::reset`] has been called.
    pub fn reset_count(&self) -> u32 {
        self.reset_count
    }

    /// Whether an infinite transfer is currently armed.
    pub fn infinite_transfer_armed(&self) -> bool {
        self.infinite_transfer_armed
    }

    /// Whether [`Dma::destroy`] has been called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn take_failure(&self) -> Result<(), MockError> {
        if self.fail_next.replace(false) {
            Err(MockError)
        } else {
            Ok(())
        }
    }
}

impl<S: DmaCompletionSink> Dma for MockDma<S> {
    type Error = MockError;

    fn configure(&mut self, ring: DmaRingConfig) -> Result<(), Self::Error> {
        self.take_failure()?;
        self.configured = Some(ring);
        Ok(())
    }

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.take_failure()?;
        self.reset_count += 1;
        self.infinite_transfer_armed = false;
        Ok(())
    }

    fn set_infinite_transfer(&mut self) -> Result<(), Self::Error> {
        self.take_failure()?;
        self.infinite_transfer_armed = true;
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), Self::Error> {
        self.take_failure()?;
        self.destroyed = true;
        Ok(())
    }
}

/// Mock PIB transport state machine.
///
/// Every field is an atomic rather than a plain `Cell` so `&MockPib` also
/// implements [`Pib`] (see below) from a `'static` reference shared across
/// threads — the same shared-observability shape as [`MockDma`]'s sink,
/// needed so an out-of-crate integration test can hold onto a `static`
/// handle and drive `set_state_for_test` after handing the mock to a
/// `Supervisor` by reference. A single test thread only ever touches one
/// of these at a time, so `Relaxed` ordering is enough.
pub struct MockPib {
    state: AtomicU8,
    waveform_loaded: AtomicBool,
    trigger_asserted: AtomicBool,
    fail_next: AtomicBool,
}

impl MockPib {
    /// A freshly force-stopped mock SM, matching the real SM's reset state.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(crate::pib::STATE_DISABLED),
            waveform_loaded: AtomicBool::new(false),
            trigger_asserted: AtomicBool::new(false),
            fail_next: AtomicBool::new(false),
        }
    }

    /// Arm the next fallible call to fail.
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::Relaxed);
    }

    /// Move the SM to a state directly, simulating hardware progress
    /// between watchdog polls (e.g. into the BUSY/WAIT set).
    pub fn set_state_for_test(&self, state: u8) {
        self.state.store(state, Ordering::Relaxed);
    }

    /// Whether a waveform has been loaded since the last `disable`.
    pub fn waveform_loaded(&self) -> bool {
        self.waveform_loaded.load(Ordering::Relaxed)
    }

    /// Whether the firmware trigger is currently asserted.
    pub fn trigger_asserted(&self) -> bool {
        self.trigger_asserted.load(Ordering::Relaxed)
    }

    fn take_failure(&self) -> Result<(), MockError> {
        if self.fail_next.swap(false, Ordering::Relaxed) {
            Err(MockError)
        } else {
            Ok(())
        }
    }

    fn do_load_waveform(&self) -> Result<(), MockError> {
        self.take_failure()?;
        self.waveform_loaded.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn do_start(&self, state: u8) -> Result<(), MockError> {
        self.take_failure()?;
        self.state.store(state, Ordering::Relaxed);
        Ok(())
    }

    fn do_disable(&self, force: bool) -> Result<(), MockError> {
        self.take_failure()?;
        debug_assert!(force, "the supervisor only ever force-disables");
        self.state.store(crate::pib::STATE_DISABLED, Ordering::Relaxed);
        self.waveform_loaded.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn do_set_sw_trigger(&self, asserted: bool) -> Result<(), MockError> {
        self.take_failure()?;
        self.trigger_asserted.store(asserted, Ordering::Relaxed);
        Ok(())
    }
}

impl Default for MockPib {
    fn default() -> Self {
        Self::new()
    }
}

impl Pib for MockPib {
    type Error = MockError;

    fn load_waveform(&mut self, _waveform: &[u8]) -> Result<(), Self::Error> {
        self.do_load_waveform()
    }

    fn start(&mut self, state: u8) -> Result<(), Self::Error> {
        self.do_start(state)
    }

    fn disable(&mut self, force: bool) -> Result<(), Self::Error> {
        self.do_disable(force)
    }

    fn set_sw_trigger(&mut self, asserted: bool) -> Result<(), Self::Error> {
        self.do_set_sw_trigger(asserted)
    }

    fn sm_state(&self) -> u8 {
        self.state.load(Ordering::Relaxed)
    }
}

/// Lets a caller retain a `&'static MockPib` handle (for
/// [`MockPib::set_state_for_test`]) while still handing the supervisor
/// something that implements [`Pib`] by reference.
impl Pib for &MockPib {
    type Error = MockError;

    fn load_waveform(&mut self, _waveform: &[u8]) -> Result<(), Self::Error> {
        (**self).do_load_waveform()
    }

    fn start(&mut self, state: u8) -> Result<(), Self::Error> {
        (**self).do_start(state)
    }

    fn disable(&mut self, force: bool) -> Result<(), Self::Error> {
        (**self).do_disable(force)
    }

    fn set_sw_trigger(&mut self, asserted: bool) -> Result<(), Self::Error> {
        (**self).do_set_sw_trigger(asserted)
    }

    fn sm_state(&self) -> u8 {
        self.state.load(Ordering::Relaxed)
    }
}

/// Mock bulk endpoint.
pub struct MockBulkEndpoint {
    configure_calls: u32,
    flush_calls: u32,
    halt_clear_calls: u32,
    fail_next: Cell<bool>,
}

impl MockBulkEndpoint {
    /// A freshly unconfigured mock endpoint.
    pub fn new() -> Self {
        Self {
            configure_calls: 0,
            flush_calls: 0,
            halt_clear_calls: 0,
            fail_next: Cell::new(false),
        }
    }

    /// Arm the next fallible call to fail.
    pub fn fail_next_call(&self) {
        self.fail_next.set(true);
    }

    /// Number of times [`BulkEndpoint::flush`] has been called.
    pub fn flush_calls(&self) -> u32 {
        self.flush_calls
    }

    /// Number of times [`BulkEndpoint::clear_halt`] has been called.
    pub fn halt_clear_calls(&self) -> u32 {
        self.halt_clear_calls
    }

    fn take_failure(&self) -> Result<(), MockError> {
        if self.fail_next.replace(false) {
            Err(MockError)
        } else {
            Ok(())
        }
    }
}

impl Default for MockBulkEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkEndpoint for MockBulkEndpoint {
    type Error = MockError;

    fn configure(&mut self, _burst_len: u8, _packet_size: u16) -> Result<(), Self::Error> {
        self.take_failure()?;
        self.configure_calls += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.take_failure()?;
        self.flush_calls += 1;
        Ok(())
    }

    fn clear_halt(&mut self, _reset_toggle: bool) -> Result<(), Self::Error> {
        self.take_failure()?;
        self.halt_clear_calls += 1;
        Ok(())
    }
}

/// Mock I²C bus with a tiny register map and per-address NACK injection.
///
/// The register map is a flat association list rather than a hash map —
/// the mock only ever holds a handful of entries (clock-chip + tuner
/// registers across a couple of I²C addresses), so linear lookup is simpler
/// than pulling in a hashing scheme for no benefit.
pub struct MockI2c {
    registers: heapless::Vec<((u8, u8), u8), 64>,
    nack_addresses: heapless::Vec<u8, 8>,
    failure_count: u32,
}

impl MockI2c {
    /// An I²C bus where every address ACKs and reads as zero until
    /// poked with [`Self::set_register`].
    pub fn new() -> Self {
        Self {
            registers: heapless::Vec::new(),
            nack_addresses: heapless::Vec::new(),
            failure_count: 0,
        }
    }

    /// Seed a register's value, as if a prior write (or reset default)
    /// had set it.
    pub fn set_register(&mut self, addr: u8, reg: u8, value: u8) {
        if let Some(entry) = self.registers.iter_mut().find(|(k, _)| *k == (addr, reg)) {
            entry.1 = value;
        } else {
            let _ = self.registers.push(((addr, reg), value));
        }
    }

    /// Make every transfer to `addr` fail (e.g. an absent device).
    pub fn nack_address(&mut self, addr: u8) {
        let _ = self.nack_addresses.push(addr);
    }

    /// Cumulative failed-transfer count, mirroring the `i2c_failures` stat.
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Read back a register as last written, for asserting on a driver's
    /// output rather than only its return value.
    pub fn register_for_test(&self, addr: u8, reg: u8) -> u8 {
        self.register(addr, reg)
    }

    fn register(&self, addr: u8, reg: u8) -> u8 {
        self.registers
            .iter()
            .find(|(k, _)| *k == (addr, reg))
            .map_or(0, |(_, v)| *v)
    }
}

impl Default for MockI2c {
    fn default() -> Self {
        Self::new()
    }
}

impl I2c for MockI2c {
    type Error = MockError;

    fn transfer(
        &mut self,
        addr: u8,
        reg: u8,
        buf: &mut [u8],
        is_read: bool,
    ) -> Result<(), Self::Error> {
        if self.nack_addresses.contains(&addr) {
            self.failure_count += 1;
            return Err(MockError);
        }
        if is_read {
            for (i, slot) in buf.iter_mut().enumerate() {
                let reg_n = reg.wrapping_add(i as u8);
                *slot = self.register(addr, reg_n);
            }
        } else {
            for (i, &byte) in buf.iter().enumerate() {
                let reg_n = reg.wrapping_add(i as u8);
                self.set_register(addr, reg_n, byte);
            }
        }
        Ok(())
    }
}

/// Mock GPIO bank: a flat array of logical pin states, indexed by id.
pub struct MockGpio {
    pins: [bool; 32],
    directions: [Option<Direction>; 32],
}

impl MockGpio {
    /// All pins low, unconfigured.
    pub fn new() -> Self {
        Self {
            pins: [false; 32],
            directions: [None; 32],
        }
    }

    /// Drive a pin from test code, simulating external hardware (e.g. a
    /// strap that the boot probe senses).
    pub fn set_pin_for_test(&mut self, id: u8, value: bool) {
        self.pins[id as usize] = value;
    }

    /// Whether `configure` has been called for `id`.
    pub fn is_configured(&self, id: u8) -> bool {
        self.directions[id as usize].is_some()
    }
}

impl Default for MockGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl Gpio for MockGpio {
    type Error = MockError;

    fn configure(&mut self, id: u8, dir: Direction, _pull: Pull) -> Result<(), Self::Error> {
        self.directions[id as usize] = Some(dir);
        Ok(())
    }

    fn set_pin(&mut self, id: u8, value: bool) -> Result<(), Self::Error> {
        self.pins[id as usize] = value;
        Ok(())
    }

    fn get_pin(&self, id: u8) -> Result<bool, Self::Error> {
        Ok(self.pins[id as usize])
    }
}

/// Mock system-reset hook: counts calls instead of rebooting.
pub struct MockSystemControl {
    reset_calls: u32,
}

impl MockSystemControl {
    /// A mock with no reset calls recorded yet.
    pub fn new() -> Self {
        Self { reset_calls: 0 }
    }

    /// Number of times [`SystemControl::reset_to_bootloader`] was called.
    pub fn reset_calls(&self) -> u32 {
        self.reset_calls
    }
}

impl Default for MockSystemControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemControl for MockSystemControl {
    fn reset_to_bootloader(&mut self) {
        self.reset_calls += 1;
    }
}
