//! USB driver task (hardware only).
//!
//! This is the one place the event-driven control plane meets a concrete
//! USB controller. No vendor SDK bindings for the target's USB-3
//! peripheral exist anywhere in this workspace, so [`UsbController`] is
//! the seam a real driver plugs into: everything on this side of the
//! trait (EP0 dispatch, re-enumeration handling, the watchdog tick) is
//! real, tested logic; everything past it is vendor register pokes this
//! crate does not have headers for.
//!
//! See `crate::app` for the event/watchdog loop this task shares a
//! [`supervisor::Supervisor`] with, and [`usbctl::Dispatcher`] for the
//! EP0 command table itself.

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_futures::select::{select3, Either3};
use eventbus::{ConsoleRx, ConsoleTx, EventReceiver, EventSender, PibErrorLatch};
use platform::config::EP0_SCRATCH_LEN;
use platform::{BulkEndpoint, Dma, Gpio, I2c, Pib, SystemControl};
use usbctl::{DispatchOutcome, Dispatcher, SetupPacket};

use crate::app;

/// Everything a concrete USB-3 peripheral driver needs to expose for the
/// EP0 command table and the re-enumeration hooks to run. The three event
/// codes this trait's driver-event stream is expected to produce are
/// `app::USB_EVENT_SETCONF`, `app::USB_EVENT_RESET`, and
/// `app::USB_EVENT_DISCONNECT`; anything else is forwarded as an opaque
/// diagnostic event.
///
/// TODO: no implementation of this trait exists yet. The target's USB-3
/// peripheral (FX3-class, SuperSpeed bulk) needs a register-level driver
/// this workspace has no vendor headers for; until then `main.rs` cannot
/// construct a real [`UsbController`] and the hardware build is
/// link-incomplete by design.
pub trait UsbController {
    /// Transport-level error (timeout, PHY fault, ...).
    type Error;

    /// Wait for the next SETUP packet, copying an OUT data stage (if any)
    /// into `scratch` before returning.
    async fn next_setup(&mut self, scratch: &mut [u8; EP0_SCRATCH_LEN]) -> SetupPacket;

    /// Send `scratch[..len]` as the IN data stage of the transfer most
    /// recently returned by [`Self::next_setup`].
    async fn send_in_data(&mut self, scratch: &[u8], len: usize) -> Result<(), Self::Error>;

    /// Acknowledge a zero-length status stage.
    async fn ack(&mut self) -> Result<(), Self::Error>;

    /// Stall both stages of the current control transfer.
    async fn stall(&mut self) -> Result<(), Self::Error>;

    /// Wait for the next driver-level event, already translated to one of
    /// the `crate::app::USB_EVENT_*` codes (or an opaque code for anything
    /// this driver doesn't distinguish).
    async fn next_driver_event(&mut self) -> u32;
}

/// Run the USB driver task forever: dispatch EP0 control transfers, relay
/// driver-level events into the application event/watchdog loop, and keep
/// the streaming supervisor's watchdog ticking between them. Spawned once
/// from `main`.
#[allow(clippy::too_many_arguments)]
pub async fn run<C, D, P, B, I2C, G, SYS>(
    controller: &mut C,
    dispatcher: &mut Dispatcher<D, P, B, I2C, G, SYS>,
    driver_events: EventSender<'static>,
    events: &mut EventReceiver<'_>,
    pib_errors: &'static PibErrorLatch,
    console_tx: &'static Mutex<RefCell<ConsoleTx>>,
    console_rx: &'static Mutex<RefCell<ConsoleRx>>,
) -> !
where
    C: UsbController,
    D: Dma,
    P: Pib,
    B: BulkEndpoint,
    I2C: I2c,
    G: Gpio,
    SYS: SystemControl,
{
    let mut scratch = [0u8; EP0_SCRATCH_LEN];
    loop {
        match select3(
            controller.next_setup(&mut scratch),
            controller.next_driver_event(),
            app::step(dispatcher.supervisor(), events, pib_errors, console_tx, console_rx),
        )
        .await
        {
            Either3::First(setup) => {
                let outcome = dispatcher.dispatch(&setup, &mut scratch).await;
                let _ = send_outcome(controller, &scratch, outcome).await;
            }
            Either3::Second(id) => {
                driver_events.try_post(eventbus::Event::Usb(id));
            }
            Either3::Third(()) => {}
        }
    }
}

async fn send_outcome<C: UsbController>(
    controller: &mut C,
    scratch: &[u8; EP0_SCRATCH_LEN],
    outcome: DispatchOutcome,
) -> Result<(), C::Error> {
    match outcome {
        DispatchOutcome::Stall => controller.stall().await,
        DispatchOutcome::Ack => controller.ack().await,
        DispatchOutcome::DataIn(len) => controller.send_in_data(scratch, len).await,
    }
}

pub use app::is_reenumeration_event;
