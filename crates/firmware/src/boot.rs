//! Boot-time analog-front-end probe.
//!
//! Before any host has enumerated the device, the firmware briefly powers
//! an external tuner IC off the clock generator's secondary output, reads
//! the tuner's I²C identity register, and senses a strap GPIO for a board
//! revision bit. The result is cached once as [`HwConfig`] and reported by
//! every subsequent `INFO` request; the primary ADC clock is left disabled
//! until the host issues `SET_ADC`.

use clockgen::ClockController;
use platform::{Gpio, I2c};

/// I²C address of the R828D-class tuner this probe looks for.
const TUNER_I2C_ADDR: u8 = 0x74;
/// Tuner identity register read during the probe.
const TUNER_IDENTITY_REG: u8 = 1;
/// Secondary-clock frequency used to power the tuner just long enough to
/// probe it.
const PROBE_CLOCK_HZ: u32 = 16_000_000;
/// Board-revision strap line, sensed with an internal pull-up; low means
/// the tuner daughterboard is actually present.
const STRAP_SENSE_PIN: u8 = 36;

/// Cached boot-time hardware identification, reported by `INFO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HwConfig {
    /// No tuner detected; ADC-only front end.
    NoRadio,
    /// R828D tuner detected and the strap line confirms the daughterboard.
    Rx888r2,
}

impl HwConfig {
    /// The `INFO` wire byte.
    #[must_use]
    pub fn to_wire(self) -> u8 {
        match self {
            HwConfig::NoRadio => 0x00,
            HwConfig::Rx888r2 => 0x04,
        }
    }
}

/// Run the boot-time probe: power the tuner, read its identity register,
/// sense the strap line, then power the tuner back down regardless of the
/// outcome. Never fails — an absent tuner or a failed transfer both decode
/// to [`HwConfig::NoRadio`], matching the reference firmware's "no R828D
/// tuner detected" fallback.
pub fn probe_hw_config<I2C: I2c, G: Gpio>(clock: &mut ClockController<I2C>, gpio: &mut G) -> HwConfig {
    let _ = clock.set_secondary_clock(PROBE_CLOCK_HZ);

    let mut identity = [0u8; 1];
    let tuner_present = clock
        .raw_transfer(TUNER_I2C_ADDR, TUNER_IDENTITY_REG, &mut identity, true)
        .is_ok();

    let config = if tuner_present {
        match gpio.get_pin(STRAP_SENSE_PIN) {
            Ok(false) => HwConfig::Rx888r2,
            _ => HwConfig::NoRadio,
        }
    } else {
        HwConfig::NoRadio
    };

    let _ = clock.set_secondary_clock(0);
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::mocks::{MockGpio, MockI2c};

    #[test]
    fn tuner_present_and_strap_low_detects_rx888r2() {
        let mut i2c = MockI2c::new();
        i2c.set_register(TUNER_I2C_ADDR, TUNER_IDENTITY_REG, 0x69);
        let mut clock = ClockController::new(i2c);
        let mut gpio = MockGpio::new();
        gpio.set_pin_for_test(STRAP_SENSE_PIN, false);

        assert_eq!(probe_hw_config(&mut clock, &mut gpio), HwConfig::Rx888r2);
    }

    #[test]
    fn tuner_present_but_strap_high_falls_back_to_no_radio() {
        let mut i2c = MockI2c::new();
        i2c.set_register(TUNER_I2C_ADDR, TUNER_IDENTITY_REG, 0x69);
        let mut clock = ClockController::new(i2c);
        let mut gpio = MockGpio::new();
        gpio.set_pin_for_test(STRAP_SENSE_PIN, true);

        assert_eq!(probe_hw_config(&mut clock, &mut gpio), HwConfig::NoRadio);
    }

    #[test]
    fn absent_tuner_decodes_to_no_radio() {
        let mut i2c = MockI2c::new();
        i2c.nack_address(TUNER_I2C_ADDR);
        let mut clock = ClockController::new(i2c);
        let mut gpio = MockGpio::new();

        assert_eq!(probe_hw_config(&mut clock, &mut gpio), HwConfig::NoRadio);
    }

    #[test]
    fn probe_always_leaves_the_secondary_clock_disabled() {
        let mut i2c = MockI2c::new();
        i2c.nack_address(TUNER_I2C_ADDR);
        let mut clock = ClockController::new(i2c);
        let mut gpio = MockGpio::new();

        probe_hw_config(&mut clock, &mut gpio);
        // A disabled secondary output is a CLK2_CONTROL write of 0x80; the
        // mock records state per-register, so confirm the control byte
        // reflects power-down rather than asserting on call counts.
        assert_eq!(
            i2c.register_for_test(clockgen::si5351::I2C_ADDR, clockgen::si5351::REG_CLK2_CONTROL),
            0x80
        );
    }
}
