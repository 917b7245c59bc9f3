//! The EP0 command dispatcher.
//!
//! One entry point, [`Dispatcher::dispatch`], fed a decoded SETUP packet and
//! a caller-owned scratch buffer. This module never touches a concrete USB
//! controller — the USB driver task (firmware, hardware-gated) copies an OUT
//! data stage into `scratch` before calling `dispatch`, and turns a
//! returned [`DispatchOutcome::DataIn`] into an IN data stage afterwards.
//! Keeping the controller out of this crate's dependency graph is
//! deliberate: every vendor request is plain, synchronously testable logic
//! over the platform traits and the streaming supervisor.

use core::cell::RefCell;

use critical_section::Mutex;
use eventbus::{ConsoleRx, ConsoleTx, Event, EventSender, PibErrorLatch, StatsCounters};
use platform::config::EP0_SCRATCH_LEN;
use platform::{BulkEndpoint, Dma, Gpio, I2c, Pib, SystemControl};
use supervisor::Supervisor;

use crate::request::{SetArgId, VendorRequest};
use crate::setup::SetupPacket;

/// GPIO pin ids carried by the front-end `GPIO` word: the bit position
/// doubles as the pin id, since the core never needs a separate lookup
/// table for a direct bit-to-pin mapping.
const GPIO_BITS: &[u8] = &[5, 6, 7, 8, 9, 11, 15, 16];

/// 3-wire bit-bang pins for the attenuator's serial-in latch (PE4304-style).
/// Board-level GPIO wiggling for the analog front end is explicitly out of
/// scope as a hardware concern; this is the one place the core still has
/// to drive it, through nothing but [`Gpio::set_pin`].
const ATTEN_CLK_PIN: u8 = 20;
const ATTEN_DATA_PIN: u8 = 21;
const ATTEN_LATCH_PIN: u8 = 22;
/// 3-wire bit-bang pins for the VGA's serial-in latch (AD8370-style).
const VGA_CLK_PIN: u8 = 23;
const VGA_DATA_PIN: u8 = 24;
const VGA_LATCH_PIN: u8 = 25;

/// Outcome of one [`Dispatcher::dispatch`] call. The USB driver task
/// translates this into the matching EP0 control-transfer action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Stall both stages of the control transfer.
    Stall,
    /// Zero-length status-stage ACK; no data phase.
    Ack,
    /// An IN data phase of this many bytes is ready in the scratch buffer.
    DataIn(usize),
}

/// The EP0 vendor request dispatcher. Generic over the same platform traits
/// as [`Supervisor`], plus a GPIO bank (front end and attenuator/VGA wiggling)
/// and a system-reset hook (`RESET`).
pub struct Dispatcher<D, P, B, I2C, G, SYS> {
    supervisor: Supervisor<D, P, B, I2C>,
    gpio: G,
    system: SYS,
    events: EventSender<'static>,
    pib_errors: &'static PibErrorLatch,
    console_tx: &'static Mutex<RefCell<ConsoleTx>>,
    console_rx: &'static Mutex<RefCell<ConsoleRx>>,
    hwconfig: u8,
    vendor_req_count: u8,
    debug_mode: bool,
}

impl<D, P, B, I2C, G, SYS> Dispatcher<D, P, B, I2C, G, SYS>
where
    D: Dma,
    P: Pib,
    B: BulkEndpoint,
    I2C: I2c,
    G: Gpio,
    SYS: SystemControl,
{
    /// Build a dispatcher around its hardware handles. `hwconfig` is the
    /// cached boot-time analog-front-end probe result; it never changes
    /// after construction.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        supervisor: Supervisor<D, P, B, I2C>,
        gpio: G,
        system: SYS,
        events: EventSender<'static>,
        pib_errors: &'static PibErrorLatch,
        console_tx: &'static Mutex<RefCell<ConsoleTx>>,
        console_rx: &'static Mutex<RefCell<ConsoleRx>>,
        hwconfig: u8,
    ) -> Self {
        Self {
            supervisor,
            gpio,
            system,
            events,
            pib_errors,
            console_tx,
            console_rx,
            hwconfig,
            vendor_req_count: 0,
            debug_mode: false,
        }
    }

    /// The streaming supervisor, for a USB driver task that also needs to
    /// react to re-enumeration/disconnect events.
    pub fn supervisor(&mut self) -> &mut Supervisor<D, P, B, I2C> {
        &mut self.supervisor
    }

    /// The free-running 8-bit vendor-request counter, wrapping at 256.
    #[must_use]
    pub fn vendor_req_count(&self) -> u8 {
        self.vendor_req_count
    }

    /// True once a host has sent `INFO` with `wValue == 1`.
    #[must_use]
    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// Handle one control transfer. `scratch` holds the OUT data stage (if
    /// any) on entry, and the IN data stage (if [`DispatchOutcome::DataIn`]
    /// is returned) on exit.
    pub async fn dispatch(
        &mut self,
        setup: &SetupPacket,
        scratch: &mut [u8; EP0_SCRATCH_LEN],
    ) -> DispatchOutcome {
        if setup.length as usize > EP0_SCRATCH_LEN {
            return DispatchOutcome::Stall;
        }

        if setup.is_clear_endpoint_halt() {
            return match self.supervisor.on_bulk_endpoint_halt_clear() {
                Ok(()) => DispatchOutcome::Ack,
                Err(_) => DispatchOutcome::Stall,
            };
        }
        if setup.is_clear_function_suspend() {
            return if self.supervisor.state().is_active() {
                DispatchOutcome::Ack
            } else {
                DispatchOutcome::Stall
            };
        }

        let outcome = match VendorRequest::from_code(setup.request) {
            VendorRequest::Start => self.handle_start().await,
            VendorRequest::Stop => self.handle_stop().await,
            VendorRequest::Info => self.handle_info(setup.value, scratch),
            VendorRequest::Gpio => self.handle_gpio(setup.length, scratch),
            VendorRequest::I2cWrite => self.handle_i2c_write(setup, scratch),
            VendorRequest::I2cRead => self.handle_i2c_read(setup, scratch),
            VendorRequest::Reset => self.handle_reset().await,
            VendorRequest::SetAdc => self.handle_set_adc(setup.length, scratch).await,
            VendorRequest::Stats => self.handle_stats(scratch),
            VendorRequest::SetArg => self.handle_set_arg(setup),
            VendorRequest::DebugIo => self.handle_debug_io(setup.value, scratch),
            VendorRequest::Unknown(_) => DispatchOutcome::Stall,
        };

        if !matches!(outcome, DispatchOutcome::Stall) {
            self.vendor_req_count = self.vendor_req_count.wrapping_add(1);
            self.events.try_post(Event::VendorTrace(setup.request));
        }
        outcome
    }

    async fn handle_start(&mut self) -> DispatchOutcome {
        match self.supervisor.start().await {
            Ok(()) => DispatchOutcome::Ack,
            Err(_) => DispatchOutcome::Stall,
        }
    }

    async fn handle_stop(&mut self) -> DispatchOutcome {
        self.supervisor.stop().await;
        DispatchOutcome::Ack
    }

    fn handle_info(&mut self, value: u16, scratch: &mut [u8; EP0_SCRATCH_LEN]) -> DispatchOutcome {
        if value == 1 {
            self.debug_mode = true;
        }
        scratch[0] = self.hwconfig;
        scratch[1] = platform::config::FIRMWARE_VER_MAJOR;
        scratch[2] = platform::config::FIRMWARE_VER_MINOR;
        scratch[3] = self.vendor_req_count;
        DispatchOutcome::DataIn(4)
    }

    fn handle_gpio(&mut self, length: u16, scratch: &[u8; EP0_SCRATCH_LEN]) -> DispatchOutcome {
        if length != 4 {
            return DispatchOutcome::Stall;
        }
        let mask = u32::from_le_bytes([scratch[0], scratch[1], scratch[2], scratch[3]]);
        for &bit in GPIO_BITS {
            let value = mask & (1 << bit) != 0;
            if self.gpio.set_pin(bit, value).is_err() {
                return DispatchOutcome::Stall;
            }
        }
        DispatchOutcome::Ack
    }

    fn handle_i2c_write(
        &mut self,
        setup: &SetupPacket,
        scratch: &mut [u8; EP0_SCRATCH_LEN],
    ) -> DispatchOutcome {
        let len = setup.length as usize;
        let addr = setup.value as u8;
        let reg = setup.index as u8;
        match self
            .supervisor
            .clock()
            .raw_transfer(addr, reg, &mut scratch[..len], false)
        {
            Ok(()) => DispatchOutcome::Ack,
            Err(_) => DispatchOutcome::Stall,
        }
    }

    fn handle_i2c_read(
        &mut self,
        setup: &SetupPacket,
        scratch: &mut [u8; EP0_SCRATCH_LEN],
    ) -> DispatchOutcome {
        let len = setup.length as usize;
        let addr = setup.value as u8;
        let reg = setup.index as u8;
        match self
            .supervisor
            .clock()
            .raw_transfer(addr, reg, &mut scratch[..len], true)
        {
            Ok(()) => DispatchOutcome::DataIn(len),
            Err(_) => DispatchOutcome::Stall,
        }
    }

    async fn handle_reset(&mut self) -> DispatchOutcome {
        embassy_time::Timer::after_millis(platform::config::RESET_DELAY_MS).await;
        self.system.reset_to_bootloader();
        DispatchOutcome::Ack
    }

    async fn handle_set_adc(
        &mut self,
        length: u16,
        scratch: &[u8; EP0_SCRATCH_LEN],
    ) -> DispatchOutcome {
        if length != 4 {
            return DispatchOutcome::Stall;
        }
        let freq_hz = u32::from_le_bytes([scratch[0], scratch[1], scratch[2], scratch[3]]);
        if self.supervisor.set_adc_clock_safely(freq_hz).await.is_err() {
            return DispatchOutcome::Stall;
        }
        let _ = self.supervisor.clock().wait_for_lock().await;
        DispatchOutcome::Ack
    }

    fn handle_stats(&mut self, scratch: &mut [u8; EP0_SCRATCH_LEN]) -> DispatchOutcome {
        let clock_chip_status = self.supervisor.clock().status_register().unwrap_or(0xFF);
        let counters = StatsCounters {
            dma_completions: self.supervisor.dma_completions(),
            pib_sm_state: self.supervisor.pib_state(),
            pib_error_count: self.pib_errors.total(),
            last_pib_error_arg: self.pib_errors.last_arg(),
            i2c_failure_count: self.supervisor.clock().i2c_failure_count(),
            streaming_fault_count: self.supervisor.streaming_fault_count(),
            clock_chip_status,
        };
        let wire = counters.to_wire();
        scratch[..wire.len()].copy_from_slice(&wire);
        DispatchOutcome::DataIn(wire.len())
    }

    fn handle_set_arg(&mut self, setup: &SetupPacket) -> DispatchOutcome {
        let Some(id) = SetArgId::from_index(setup.index) else {
            return DispatchOutcome::Stall;
        };
        match id {
            SetArgId::Attenuator => {
                if setup.value > 63 {
                    return DispatchOutcome::Stall;
                }
                if self
                    .shift_out(ATTEN_CLK_PIN, ATTEN_DATA_PIN, ATTEN_LATCH_PIN, setup.value.into(), 6)
                    .is_err()
                {
                    return DispatchOutcome::Stall;
                }
            }
            SetArgId::Vga => {
                if setup.value > 255 {
                    return DispatchOutcome::Stall;
                }
                if self
                    .shift_out(VGA_CLK_PIN, VGA_DATA_PIN, VGA_LATCH_PIN, setup.value.into(), 8)
                    .is_err()
                {
                    return DispatchOutcome::Stall;
                }
            }
            SetArgId::WatchdogCap => {
                if setup.value > 255 {
                    return DispatchOutcome::Stall;
                }
                self.supervisor.set_recovery_cap(setup.value as u8);
            }
        }
        DispatchOutcome::Ack
    }

    /// Shift `bits` bits of `value` out MSB-first on `data`, pulsing `clk`
    /// once per bit, then pulse `latch` — the 3-wire protocol both the
    /// attenuator and VGA serial front ends share.
    fn shift_out(&mut self, clk: u8, data: u8, latch: u8, value: u32, bits: u32) -> Result<(), G::Error> {
        for i in (0..bits).rev() {
            self.gpio.set_pin(data, (value >> i) & 1 != 0)?;
            self.gpio.set_pin(clk, true)?;
            self.gpio.set_pin(clk, false)?;
        }
        self.gpio.set_pin(latch, true)?;
        self.gpio.set_pin(latch, false)?;
        Ok(())
    }

    fn handle_debug_io(&mut self, value: u16, scratch: &mut [u8; EP0_SCRATCH_LEN]) -> DispatchOutcome {
        let ch = value as u8;
        if ch != 0 {
            let mapped = if ch == 0x0D { b'\n' } else { ch };
            let completed_line = critical_section::with(|cs| {
                self.console_rx.borrow(cs).borrow_mut().push_byte(mapped)
            });
            if completed_line {
                self.events.try_post(Event::UserCommand);
            }
        }

        let max = EP0_SCRATCH_LEN - 1;
        let drained =
            critical_section::with(|cs| self.console_tx.borrow(cs).borrow_mut().drain_into(&mut scratch[..max]));
        scratch[drained] = 0;
        DispatchOutcome::DataIn(drained + 1)
    }
}
