//! System-reset abstraction.
//!
//! The actual reboot-to-bootloader mechanism (typically a watchdog-assisted
//! self-reset) is board firmware, not this crate's concern — no bootloader
//! is implemented here. This trait exists only so the `RESET` vendor
//! request has something to call: a real implementation never returns, a
//! host-side test double just records that the call happened.
pub trait SystemControl {
    /// Trigger a hardware reset back into the bootloader. On real hardware
    /// this does not return.
    fn reset_to_bootloader(&mut self);
}
