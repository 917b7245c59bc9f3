//! Vendor request and SET_ARG argument id tables.
//!
//! Switching on the raw `bRequest`/`wIndex` byte anywhere but here is the
//! one thing this module exists to prevent: an unrecognized code must
//! decode to a variant whose handler stalls, never panic or index out of
//! bounds, however arbitrary the host's input.

/// Vendor request codes, decoded from `bRequest` on a vendor-type SETUP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorRequest {
    /// 0xAA — arm and start streaming.
    Start,
    /// 0xAB — stop streaming.
    Stop,
    /// 0xAC — device identity and counters.
    Info,
    /// 0xAD — update the front-end GPIO word.
    Gpio,
    /// 0xAE — write to an arbitrary I2C device/register.
    I2cWrite,
    /// 0xAF — read from an arbitrary I2C device/register.
    I2cRead,
    /// 0xB1 — reset to bootloader.
    Reset,
    /// 0xB2 — reprogram the ADC sample clock.
    SetAdc,
    /// 0xB3 — diagnostic counters snapshot.
    Stats,
    /// 0xB6 — set a named runtime argument.
    SetArg,
    /// 0xBA — debug console read/write.
    DebugIo,
    /// Any code not in the table above, including the defined gaps
    /// (0xB0, 0xB7, 0xB9). Always stalls.
    Unknown(u8),
}

impl VendorRequest {
    /// Decode a raw `bRequest` byte. Total function: every `u8` maps to a
    /// variant.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0xAA => Self::Start,
            0xAB => Self::Stop,
            0xAC => Self::Info,
            0xAD => Self::Gpio,
            0xAE => Self::I2cWrite,
            0xAF => Self::I2cRead,
            0xB1 => Self::Reset,
            0xB2 => Self::SetAdc,
            0xB3 => Self::Stats,
            0xB6 => Self::SetArg,
            0xBA => Self::DebugIo,
            other => Self::Unknown(other),
        }
    }
}

/// `SET_ARG` argument ids (`wIndex` on a SET_ARG request). Non-contiguous
/// gap ids stall, same discipline as [`VendorRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetArgId {
    /// Attenuator setting, 0-63.
    Attenuator,
    /// VGA gain setting, 0-255.
    Vga,
    /// Per-session watchdog recovery cap, 0 = unlimited, 1-255 = max.
    WatchdogCap,
}

impl SetArgId {
    /// Decode a `wIndex` value. `None` for any id outside the reserved set,
    /// including the gaps between 11 and 14.
    #[must_use]
    pub fn from_index(index: u16) -> Option<Self> {
        match index {
            10 => Some(Self::Attenuator),
            11 => Some(Self::Vga),
            14 => Some(Self::WatchdogCap),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_defined_code_round_trips() {
        let defined = [
            (0xAA, VendorRequest::Start),
            (0xAB, VendorRequest::Stop),
            (0xAC, VendorRequest::Info),
            (0xAD, VendorRequest::Gpio),
            (0xAE, VendorRequest::I2cWrite),
            (0xAF, VendorRequest::I2cRead),
            (0xB1, VendorRequest::Reset),
            (0xB2, VendorRequest::SetAdc),
            (0xB3, VendorRequest::Stats),
            (0xB6, VendorRequest::SetArg),
            (0xBA, VendorRequest::DebugIo),
        ];
        for (code, expected) in defined {
            assert_eq!(VendorRequest::from_code(code), expected);
        }
    }

    #[test]
    fn gap_codes_decode_to_unknown() {
        for gap in [0xB0, 0xB7, 0xB9] {
            assert_eq!(VendorRequest::from_code(gap), VendorRequest::Unknown(gap));
        }
    }

    #[test]
    fn arbitrary_code_never_panics() {
        for code in 0u8..=255 {
            let _ = VendorRequest::from_code(code);
        }
    }

    #[test]
    fn set_arg_gap_ids_are_rejected() {
        assert_eq!(SetArgId::from_index(10), Some(SetArgId::Attenuator));
        assert_eq!(SetArgId::from_index(11), Some(SetArgId::Vga));
        assert_eq!(SetArgId::from_index(14), Some(SetArgId::WatchdogCap));
        for gap in [0u16, 9, 12, 13, 15, 255] {
            assert_eq!(SetArgId::from_index(gap), None);
        }
    }
}
