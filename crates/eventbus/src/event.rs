//! Event-queue word encoding.
//!
//! Every queued event is one 32-bit word: an 8-bit kind tag in the MSB, a
//! 24-bit payload in the rest. Keeping the wire shape a plain `u32` (rather
//! than a richer enum wrapped in the queue) matches the reference's
//! `glEventAvailableQueue` of tagged machine words and keeps the queue
//! `Copy`, bounded, and allocation-free.

const KIND_SHIFT: u32 = 24;
const PAYLOAD_MASK: u32 = (1 << KIND_SHIFT) - 1;

/// Kind tag for a USB enumeration/driver event.
pub const KIND_USB_EVENT: u8 = 0x00;
/// Kind tag for a successfully dispatched vendor request (diagnostic trace).
pub const KIND_VENDOR_TRACE: u8 = 0x01;
/// Kind tag for a PIB transport error report.
pub const KIND_PIB_ERROR: u8 = 0x02;
/// Kind tag for "a console command line is ready to parse".
pub const KIND_USER_COMMAND: u8 = 0x03;

/// A decoded event-queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A numeric USB/enumeration event id from the platform USB driver.
    Usb(u32),
    /// A vendor request code, logged as a diagnostic trace token.
    VendorTrace(u8),
    /// A PIB transport error, carrying the device-reported 16-bit argument.
    PibError(u16),
    /// A console input line has been accumulated and is ready to parse.
    UserCommand,
    /// A kind tag this build does not recognize (forward-compatibility;
    /// never produced by this crate's own encoder, but `decode` must not
    /// panic on it).
    Unknown(u8, u32),
}

impl Event {
    /// Pack into the 32-bit wire word.
    #[must_use]
    pub fn encode(self) -> u32 {
        let (kind, payload) = match self {
            Event::Usb(id) => (KIND_USB_EVENT, id & PAYLOAD_MASK),
            Event::VendorTrace(code) => (KIND_VENDOR_TRACE, u32::from(code)),
            Event::PibError(arg) => (KIND_PIB_ERROR, u32::from(arg)),
            Event::UserCommand => (KIND_USER_COMMAND, 0),
            Event::Unknown(kind, payload) => (kind, payload & PAYLOAD_MASK),
        };
        (u32::from(kind) << KIND_SHIFT) | payload
    }

    /// Unpack a wire word. Never fails: an unrecognized kind tag decodes to
    /// [`Event::Unknown`] rather than erroring, mirroring the queue's
    /// "producers never block, consumer never rejects" contract.
    #[must_use]
    pub fn decode(word: u32) -> Event {
        let kind = (word >> KIND_SHIFT) as u8;
        let payload = word & PAYLOAD_MASK;
        match kind {
            KIND_USB_EVENT => Event::Usb(payload),
            KIND_VENDOR_TRACE => Event::VendorTrace(payload as u8),
            KIND_PIB_ERROR => Event::PibError(payload as u16),
            KIND_USER_COMMAND => Event::UserCommand,
            other => Event::Unknown(other, payload),
        }
    }
}
