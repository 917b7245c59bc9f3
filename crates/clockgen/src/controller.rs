//! The clock controller: Si5351 bring-up, ADC clock programming, and
//! lock-status reporting.

use crate::si5351::{self, ClockRecipe};
use platform::I2c;

/// Errors surfaced by the clock controller. Internal to the control plane —
/// never exposed across the USB wire boundary.
#[derive(Debug, thiserror_no_std::Error)]
pub enum ClockError<E: core::fmt::Debug> {
    /// The underlying I²C transfer failed.
    #[error("clock generator I2C transfer failed")]
    Bus(E),
}

/// Drives a Si5351-class clock generator over I²C.
///
/// `adc_clock_enabled` distinguishes "PLL lost lock" from "output
/// deliberately disabled": the PLL can stay locked while CLK0's output
/// gate is closed, so lock status alone never authorizes streaming —
/// the supervisor's preflight checks both.
pub struct ClockController<I2C> {
    i2c: I2C,
    adc_clock_enabled: bool,
    i2c_failure_count: u32,
}

impl<I2C: I2c> ClockController<I2C> {
    /// Wrap an I²C bus. Does not touch hardware; call [`Self::init`] next.
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            adc_clock_enabled: false,
            i2c_failure_count: 0,
        }
    }

    /// Total I²C transfer failures observed since construction, reported
    /// verbatim in the STATS wire payload.
    #[must_use]
    pub fn i2c_failure_count(&self) -> u32 {
        self.i2c_failure_count
    }

    /// Zero the failure counter, as the reference firmware does across a
    /// re-enumeration.
    pub fn reset_i2c_failure_count(&mut self) {
        self.i2c_failure_count = 0;
    }

    fn bus_result<T>(&mut self, result: Result<T, I2C::Error>) -> Result<T, ClockError<I2C::Error>> {
        result.map_err(|e| {
            self.i2c_failure_count = self.i2c_failure_count.saturating_add(1);
            ClockError::Bus(e)
        })
    }

    /// Reset the clock chip and disable all outputs.
    pub fn init(&mut self) -> Result<(), ClockError<I2C::Error>> {
        self.disable_output(si5351::REG_CLK0_CONTROL)?;
        self.disable_output(si5351::REG_CLK1_CONTROL)?;
        self.disable_output(si5351::REG_CLK2_CONTROL)?;
        self.adc_clock_enabled = false;
        Ok(())
    }

    /// Program the primary output (CLK0 / PLL A / MS0), the ADC clock.
    ///
    /// `freq_hz == 0` disables the output and clears
    /// [`Self::adc_clock_enabled`] instead of touching the PLL.
    pub fn set_adc_clock(&mut self, freq_hz: u32) -> Result<(), ClockError<I2C::Error>> {
        if freq_hz == 0 {
            self.disable_output(si5351::REG_CLK0_CONTROL)?;
            self.adc_clock_enabled = false;
            return Ok(());
        }
        let recipe = si5351::recipe_for(freq_hz, si5351::XTAL_HZ);
        self.program_output(
            &recipe,
            si5351::REG_SYNTH_PLL_A,
            si5351::REG_SYNTH_MS0,
            si5351::REG_CLK0_CONTROL,
            si5351::PLL_RESET_A_BIT,
        )?;
        self.adc_clock_enabled = true;
        Ok(())
    }

    /// Program the secondary output (CLK2 / PLL B / MS2), used only for
    /// the boot-time analog-front-end probe.
    pub fn set_secondary_clock(&mut self, freq_hz: u32) -> Result<(), ClockError<I2C::Error>> {
        if freq_hz == 0 {
            return self.disable_output(si5351::REG_CLK2_CONTROL);
        }
        let recipe = si5351::recipe_for(freq_hz, si5351::XTAL_HZ);
        self.program_output(
            &recipe,
            si5351::REG_SYNTH_PLL_B,
            si5351::REG_SYNTH_MS2,
            si5351::REG_CLK2_CONTROL,
            si5351::PLL_RESET_B_BIT,
        )
    }

    /// The cached "ADC clock output is enabled" flag.
    #[must_use]
    pub fn adc_clock_enabled(&self) -> bool {
        self.adc_clock_enabled
    }

    /// Read the status register and report `true` iff the bus transfer
    /// succeeded and PLL A's loss-of-lock bit is clear. Any I²C failure is
    /// reported as "unlocked" — fail-safe: the supervisor must never start
    /// streaming on an unverifiable clock.
    pub fn pll_locked(&mut self) -> bool {
        self.status_register()
            .map(|status| status & si5351::LOL_A_MASK == 0)
            .unwrap_or(false)
    }

    /// Poll [`Self::pll_locked`] at [`platform::config::PLL_LOCK_POLL_INTERVAL_MS`]
    /// spacing for up to [`platform::config::PLL_LOCK_POLL_ITERATIONS`]
    /// attempts, returning as soon as lock is observed. Bounds the SET_ADC
    /// handler's worst-case latency to roughly one poll interval times the
    /// iteration cap rather than spinning forever on a dead crystal.
    pub async fn wait_for_lock(&mut self) -> bool {
        for attempt in 0..platform::config::PLL_LOCK_POLL_ITERATIONS {
            if self.pll_locked() {
                return true;
            }
            if attempt + 1 < platform::config::PLL_LOCK_POLL_ITERATIONS {
                embassy_time::Timer::after_millis(platform::config::PLL_LOCK_POLL_INTERVAL_MS).await;
            }
        }
        false
    }

    /// Pass an arbitrary transfer straight through to the underlying bus,
    /// for the `I2C_WRITE`/`I2C_READ` vendor requests that let the
    /// host talk to any device on the bus, not just this clock chip.
    /// Routed through here (rather than exposing the bus directly) so
    /// every I²C failure, clock-chip or not, accumulates in the one
    /// [`Self::i2c_failure_count`] the `STATS` response reports.
    pub fn raw_transfer(
        &mut self,
        addr: u8,
        reg: u8,
        buf: &mut [u8],
        is_read: bool,
    ) -> Result<(), ClockError<I2C::Error>> {
        let result = self.i2c.transfer(addr, reg, buf, is_read);
        self.bus_result(result)
    }

    /// Raw status register read, surfaced verbatim for the STATS wire
    /// field — distinct from [`Self::pll_locked`], which interprets
    /// one bit of it.
    pub fn status_register(&mut self) -> Result<u8, ClockError<I2C::Error>> {
        let mut buf = [0u8; 1];
        let result = self
            .i2c
            .transfer(si5351::I2C_ADDR, si5351::REG_STATUS, &mut buf, true);
        self.bus_result(result)?;
        Ok(buf[0])
    }

    fn disable_output(&mut self, control_reg: u8) -> Result<(), ClockError<I2C::Error>> {
        // Bit 7 (CLKx_PDN) powers the output driver down.
        let mut buf = [0x80u8];
        let result = self.i2c.transfer(si5351::I2C_ADDR, control_reg, &mut buf, false);
        self.bus_result(result)
    }

    fn program_output(
        &mut self,
        recipe: &ClockRecipe,
        pll_reg: u8,
        ms_reg: u8,
        control_reg: u8,
        reset_bit: u8,
    ) -> Result<(), ClockError<I2C::Error>> {
        let mut pll_regs = si5351::encode_pll_registers(&recipe.pll);
        let result = self.i2c.transfer(si5351::I2C_ADDR, pll_reg, &mut pll_regs, false);
        self.bus_result(result)?;

        let mut ms_regs = si5351::encode_multisynth_registers(&recipe.ms, &recipe.r_divider);
        let result = self.i2c.transfer(si5351::I2C_ADDR, ms_reg, &mut ms_regs, false);
        self.bus_result(result)?;

        let mut reset = [reset_bit];
        let result = self
            .i2c
            .transfer(si5351::I2C_ADDR, si5351::REG_PLL_RESET, &mut reset, false);
        self.bus_result(result)?;

        // Bit 7 clear, integer-mode bit (MS_INT, bit 6) set, drive strength
        // defaults: enable the output last, after PLL/MS are programmed.
        let mut enable = [0x4Cu8];
        let result = self.i2c.transfer(si5351::I2C_ADDR, control_reg, &mut enable, false);
        self.bus_result(result)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::MockI2c;

    #[test]
    fn init_disables_every_output() {
        let mut c = ClockController::new(MockI2c::new());
        c.init().unwrap();
        assert!(!c.adc_clock_enabled());
    }

    #[test]
    fn set_adc_clock_zero_disables_without_touching_pll() {
        let mut c = ClockController::new(MockI2c::new());
        c.set_adc_clock(32_000_000).unwrap();
        assert!(c.adc_clock_enabled());
        c.set_adc_clock(0).unwrap();
        assert!(!c.adc_clock_enabled());
    }

    #[test]
    fn pll_locked_is_fail_safe_on_bus_error() {
        let mut i2c = MockI2c::new();
        i2c.nack_address(si5351::I2C_ADDR);
        let mut c = ClockController::new(i2c);
        assert!(!c.pll_locked());
    }

    #[test]
    fn pll_locked_reads_loss_of_lock_bit() {
        let mut i2c = MockI2c::new();
        i2c.set_register(si5351::I2C_ADDR, si5351::REG_STATUS, 0x00);
        let mut c = ClockController::new(i2c);
        assert!(c.pll_locked());
    }

    #[test]
    fn pll_lock_lost_bit_reports_unlocked() {
        let mut i2c = MockI2c::new();
        i2c.set_register(
            si5351::I2C_ADDR,
            si5351::REG_STATUS,
            si5351::LOL_A_MASK,
        );
        let mut c = ClockController::new(i2c);
        assert!(!c.pll_locked());
    }

    #[test]
    fn enable_flag_survives_output_disabled_but_pll_locked() {
        // Lock alone never implies the output is enabled.
        let mut i2c = MockI2c::new();
        i2c.set_register(si5351::I2C_ADDR, si5351::REG_STATUS, 0x00);
        let mut c = ClockController::new(i2c);
        assert!(c.pll_locked());
        assert!(!c.adc_clock_enabled());
    }

    #[test]
    fn failed_write_does_not_set_enabled_flag() {
        let mut i2c = MockI2c::new();
        i2c.nack_address(si5351::I2C_ADDR);
        let mut c = ClockController::new(i2c);
        assert!(c.set_adc_clock(32_000_000).is_err());
        assert!(!c.adc_clock_enabled());
    }

    #[tokio::test]
    async fn wait_for_lock_returns_as_soon_as_locked() {
        let mut i2c = MockI2c::new();
        i2c.set_register(si5351::I2C_ADDR, si5351::REG_STATUS, 0x00);
        let mut c = ClockController::new(i2c);
        assert!(c.wait_for_lock().await);
    }

    #[tokio::test]
    async fn wait_for_lock_gives_up_after_the_iteration_cap() {
        let mut i2c = MockI2c::new();
        i2c.set_register(si5351::I2C_ADDR, si5351::REG_STATUS, si5351::LOL_A_MASK);
        let mut c = ClockController::new(i2c);
        assert!(!c.wait_for_lock().await);
    }

    #[test]
    fn raw_transfer_failures_count_toward_the_same_total() {
        let mut i2c = MockI2c::new();
        i2c.nack_address(0x90);
        let mut c = ClockController::new(i2c);
        let mut buf = [0u8; 1];
        assert!(c.raw_transfer(0x90, 0, &mut buf, true).is_err());
        assert_eq!(c.i2c_failure_count(), 1);
    }

    #[test]
    fn bus_failures_accumulate_in_the_failure_counter() {
        let mut i2c = MockI2c::new();
        i2c.nack_address(si5351::I2C_ADDR);
        let mut c = ClockController::new(i2c);
        assert_eq!(c.i2c_failure_count(), 0);
        let _ = c.set_adc_clock(32_000_000);
        assert_eq!(c.i2c_failure_count(), 1);
        let _ = c.pll_locked();
        assert_eq!(c.i2c_failure_count(), 2);
    }

    #[test]
    fn reset_i2c_failure_count_zeroes_it() {
        let mut i2c = MockI2c::new();
        i2c.nack_address(si5351::I2C_ADDR);
        let mut c = ClockController::new(i2c);
        let _ = c.set_adc_clock(32_000_000);
        assert_eq!(c.i2c_failure_count(), 1);
        c.reset_i2c_failure_count();
        assert_eq!(c.i2c_failure_count(), 0);
    }
}
