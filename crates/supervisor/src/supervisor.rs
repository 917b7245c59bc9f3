//! The streaming supervisor: owns the streaming lifecycle, brings the
//! DMA ring and PIB state machine up and down, enforces the preflight gate,
//! and runs watchdog recovery.

use clockgen::ClockController;
use platform::{BulkEndpoint, Dma, I2c, Pib};

use crate::completion::CompletionCounter;
use crate::state::SessionState;
use crate::watchdog::StallWatchdog;

/// PIB state-machine entry point for a fresh or recovered session.
const PIB_START_STATE: u8 = 0;

/// Failures that can abort [`Supervisor::start`]. Per the preflight and
/// failure-semantics rules, any of these leaves the supervisor in
/// [`SessionState::Stopped`] with the DMA ring and trigger already clean —
/// cleanup runs before the step that can fail, never after.
#[derive(Debug, thiserror_no_std::Error)]
pub enum StartError<DE: core::fmt::Debug, PE: core::fmt::Debug, BE: core::fmt::Debug> {
    /// The ADC clock was not enabled, or the PLL was not reporting lock.
    #[error("preflight failed: adc clock disabled or pll unlocked")]
    Preflight,
    /// The DMA ring rejected configuration or could not be reset.
    #[error("dma ring operation failed: {0:?}")]
    Dma(DE),
    /// The PIB state machine rejected the waveform or a start/disable call.
    #[error("pib operation failed: {0:?}")]
    Pib(PE),
    /// The bulk endpoint could not be flushed.
    #[error("bulk endpoint flush failed: {0:?}")]
    Bulk(BE),
}

/// Outcome of one watchdog poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogOutcome {
    /// No session active; nothing to check.
    Idle,
    /// Session active and making progress (or not yet due for concern).
    Healthy,
    /// A wedge was detected and cleared; streaming resumed.
    Recovered,
    /// A wedge was detected; recovery ran but the clock was unlocked, or a
    /// hardware primitive failed mid-recovery. Streaming will not resume
    /// until the host intervenes.
    RecoveryAttempt,
    /// The per-session recovery cap has been reached; no further recovery
    /// will be attempted this session.
    RecoveryCapped,
}

/// Owns the streaming session: the DMA ring, the PIB state machine, the
/// bulk endpoint, and (by extension) the clock controller it must consult
/// before arming.
pub struct Supervisor<D, P, B, I2C> {
    dma: D,
    pib: P,
    bulk: B,
    clock: ClockController<I2C>,
    waveform: &'static [u8],
    completions: &'static CompletionCounter,
    watchdog: StallWatchdog,
    state: SessionState,
    recovery_count: u8,
    recovery_cap: u8,
    streaming_fault_count: u32,
}

impl<D, P, B, I2C> Supervisor<D, P, B, I2C>
where
    D: Dma,
    P: Pib,
    B: BulkEndpoint,
    I2C: I2c,
{
    /// Build a supervisor around its hardware handles. `waveform` is the
    /// PIB program loaded at every session start and recovery. `completions`
    /// is the same counter the `dma` driver was constructed with as its
    /// [`platform::DmaCompletionSink`] — a `'static` shared instance, so the
    /// completion interrupt and the watchdog poll always observe the one
    /// counter. The recovery cap starts unlimited (0); set it with
    /// [`Self::set_recovery_cap`] (mirrors the `WATCHDOG_CAP` SET_ARG id).
    pub fn new(
        dma: D,
        pib: P,
        bulk: B,
        clock: ClockController<I2C>,
        waveform: &'static [u8],
        completions: &'static CompletionCounter,
    ) -> Self {
        Self {
            dma,
            pib,
            bulk,
            clock,
            waveform,
            completions,
            watchdog: StallWatchdog::new(),
            state: SessionState::Stopped,
            recovery_count: 0,
            recovery_cap: 0,
            streaming_fault_count: 0,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Set the per-session recovery cap (0 = unlimited).
    pub fn set_recovery_cap(&mut self, cap: u8) {
        self.recovery_cap = cap;
    }

    /// The completion counter, shared with the DMA driver as its
    /// [`platform::DmaCompletionSink`].
    #[must_use]
    pub fn completion_sink(&self) -> &'static CompletionCounter {
        self.completions
    }

    /// The clock controller, for SET_ADC/STATS handlers that need it
    /// directly.
    pub fn clock(&mut self) -> &mut ClockController<I2C> {
        &mut self.clock
    }

    /// Current `dma_completions` counter (STATS field).
    #[must_use]
    pub fn dma_completions(&self) -> u32 {
        self.completions.count()
    }

    /// Free-running streaming-fault count (EP underruns plus watchdog
    /// recoveries). Persists across start/stop; only a re-enumeration
    /// resets it (owned by the caller, not this type).
    #[must_use]
    pub fn streaming_fault_count(&self) -> u32 {
        self.streaming_fault_count
    }

    /// Current PIB state-machine state byte (STATS field).
    #[must_use]
    pub fn pib_state(&self) -> u8 {
        self.pib.sm_state()
    }

    /// Start (or restart) a streaming session.
    ///
    /// A second START while already `Streaming` (or recovering) is a
    /// cleanup-and-restart, not an error: the existing session is
    /// stopped first, then the normal start sequence runs.
    pub async fn start(&mut self) -> Result<(), StartError<D::Error, P::Error, B::Error>> {
        if self.state.is_active() {
            self.stop().await;
        }

        if !(self.clock.adc_clock_enabled() && self.clock.pll_locked()) {
            return Err(StartError::Preflight);
        }

        self.pib.disable(true).map_err(StartError::Pib)?;
        self.dma.reset().map_err(StartError::Dma)?;
        self.bulk.flush().map_err(StartError::Bulk)?;

        self.completions.reset();
        self.watchdog.reset();
        self.recovery_count = 0;

        self.dma.set_infinite_transfer().map_err(StartError::Dma)?;
        self.pib.load_waveform(self.waveform).map_err(StartError::Pib)?;
        self.pib.start(PIB_START_STATE).map_err(StartError::Pib)?;
        self.pib.set_sw_trigger(true).map_err(StartError::Pib)?;

        self.state = SessionState::Streaming;
        Ok(())
    }

    /// Stop the session. Idempotent: calling this on an already
    /// stopped supervisor completes without error and without touching
    /// hardware beyond no-op flushes. Failures here are best-effort —
    /// stop must always succeed from the host's point of view.
    pub async fn stop(&mut self) {
        let _ = self.pib.set_sw_trigger(false);
        let _ = self.pib.disable(true);
        let _ = self.dma.reset();
        embassy_time::Timer::after_millis(platform::config::STOP_QUIESCE_MS).await;
        let _ = self.bulk.flush();

        self.completions.reset();
        self.watchdog.reset();
        self.recovery_count = 0;
        self.state = SessionState::Stopped;
    }

    /// Reprogram the ADC clock, implicitly stopping first if a session is
    /// active — a safety net for hosts that reprogram the clock without
    /// stopping.
    pub async fn set_adc_clock_safely(
        &mut self,
        freq_hz: u32,
    ) -> Result<(), clockgen::ClockError<I2C::Error>> {
        if self.state.is_active() {
            self.stop().await;
        }
        self.clock.set_adc_clock(freq_hz)
    }

    /// A re-enumeration (or a RESET/disconnect event while a session is
    /// active) tears the session down exactly like an explicit `STOP`, and
    /// is also the one place the free-running fault counter is zeroed. The
    /// clock controller's I²C failure counter and the PIB error latch reset
    /// alongside this from the caller, since this type does not own them.
    pub async fn on_reenumeration(&mut self) {
        self.stop().await;
        self.streaming_fault_count = 0;
    }

    /// Clear a device-side bulk endpoint stall and reset its data toggle.
    /// Deliberately does not touch the DMA ring or PIB state: resetting
    /// either here would desynchronize the host/device toggle and silently
    /// kill subsequent bulk transfers.
    pub fn on_bulk_endpoint_halt_clear(&mut self) -> Result<(), B::Error> {
        self.bulk.clear_halt(true)
    }

    /// Run one 100 ms watchdog poll. A no-op outside `Streaming`/recovery
    /// states.
    pub fn watchdog_tick(&mut self) -> WatchdogOutcome {
        if !self.state.is_active() {
            return WatchdogOutcome::Idle;
        }
        if self.state == SessionState::RecoveryCapped {
            return WatchdogOutcome::RecoveryCapped;
        }

        let sm_state = self.pib.sm_state();
        let cur = self.completions.count();
        if !self.watchdog.observe(cur, sm_state) {
            return WatchdogOutcome::Healthy;
        }

        if self.recovery_cap > 0 && self.recovery_count >= self.recovery_cap {
            self.state = SessionState::RecoveryCapped;
            return WatchdogOutcome::RecoveryCapped;
        }

        self.run_recovery()
    }

    fn run_recovery(&mut self) -> WatchdogOutcome {
        let _ = self.pib.set_sw_trigger(false);
        let _ = self.pib.disable(true);
        let _ = self.dma.reset();
        let _ = self.bulk.flush();

        if !self.clock.pll_locked() {
            self.state = SessionState::RecoveryAttempt;
            return WatchdogOutcome::RecoveryAttempt;
        }

        let recovered = self.dma.set_infinite_transfer().is_ok()
            && self.pib.load_waveform(self.waveform).is_ok()
            && self.pib.start(PIB_START_STATE).is_ok()
            && self.pib.set_sw_trigger(true).is_ok();

        self.streaming_fault_count = self.streaming_fault_count.saturating_add(1);

        if recovered {
            self.recovery_count = self.recovery_count.saturating_add(1);
            self.completions.reset();
            self.watchdog.reset();
            self.state = SessionState::Streaming;
            WatchdogOutcome::Recovered
        } else {
            self.state = SessionState::RecoveryAttempt;
            WatchdogOutcome::RecoveryAttempt
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clockgen::ClockController;
    use platform::config;
    use platform::mocks::{MockBulkEndpoint, MockDma, MockI2c, MockPib};

    const WAVEFORM: &[u8] = &[0xAA, 0x01, 0x02];

    fn locked_clock() -> ClockController<MockI2c> {
        let mut i2c = MockI2c::new();
        i2c.set_register(
            clockgen::si5351::I2C_ADDR,
            clockgen::si5351::REG_STATUS,
            0x00,
        );
        let mut clock = ClockController::new(i2c);
        clock.set_adc_clock(32_000_000).unwrap();
        clock
    }

    fn new_supervisor(
        completions: &'static CompletionCounter,
    ) -> Supervisor<MockDma<&'static CompletionCounter>, MockPib, MockBulkEndpoint, MockI2c> {
        Supervisor::new(
            MockDma::new(completions),
            MockPib::new(),
            MockBulkEndpoint::new(),
            locked_clock(),
            WAVEFORM,
            completions,
        )
    }

    #[tokio::test]
    async fn preflight_blocks_start_when_clock_disabled() {
        static COMPLETIONS: CompletionCounter = CompletionCounter::new();
        let mut sup = Supervisor::new(
            MockDma::new(&COMPLETIONS),
            MockPib::new(),
            MockBulkEndpoint::new(),
            ClockController::new(MockI2c::new()),
            WAVEFORM,
            &COMPLETIONS,
        );
        assert!(matches!(sup.start().await, Err(StartError::Preflight)));
        assert_eq!(sup.state(), SessionState::Stopped);
    }

    #[tokio::test]
    async fn start_reaches_streaming_when_preflight_passes() {
        static COMPLETIONS: CompletionCounter = CompletionCounter::new();
        let mut sup = new_supervisor(&COMPLETIONS);
        sup.start().await.unwrap();
        assert_eq!(sup.state(), SessionState::Streaming);
    }

    #[tokio::test]
    async fn on_reenumeration_stops_and_zeroes_the_fault_counter() {
        static COMPLETIONS: CompletionCounter = CompletionCounter::new();
        let mut sup = new_supervisor(&COMPLETIONS);
        sup.start().await.unwrap();
        sup.completion_sink().on_producer_committed();
        sup.pib.set_state_for_test(config::BUSY_OR_WAIT_SET[0]);
        sup.watchdog_tick();
        sup.watchdog_tick();
        sup.watchdog_tick();
        sup.watchdog_tick();
        assert!(sup.streaming_fault_count() > 0);

        sup.on_reenumeration().await;
        assert_eq!(sup.state(), SessionState::Stopped);
        assert_eq!(sup.streaming_fault_count(), 0);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        static COMPLETIONS: CompletionCounter = CompletionCounter::new();
        let mut sup = new_supervisor(&COMPLETIONS);
        sup.start().await.unwrap();
        sup.stop().await;
        sup.stop().await;
        assert_eq!(sup.state(), SessionState::Stopped);
    }

    #[tokio::test]
    async fn restart_while_streaming_is_cleanup_and_restart_not_an_error() {
        static COMPLETIONS: CompletionCounter = CompletionCounter::new();
        let mut sup = new_supervisor(&COMPLETIONS);
        sup.start().await.unwrap();
        assert!(sup.start().await.is_ok());
        assert_eq!(sup.state(), SessionState::Streaming);
    }

    #[tokio::test]
    async fn pib_state_reflects_the_running_state_machine() {
        static COMPLETIONS: CompletionCounter = CompletionCounter::new();
        let mut sup = new_supervisor(&COMPLETIONS);
        assert_eq!(sup.pib_state(), platform::pib::STATE_DISABLED);
        sup.start().await.unwrap();
        assert_eq!(sup.pib_state(), PIB_START_STATE);
    }

    #[tokio::test]
    async fn watchdog_is_idle_when_stopped() {
        static COMPLETIONS: CompletionCounter = CompletionCounter::new();
        let mut sup = new_supervisor(&COMPLETIONS);
        assert_eq!(sup.watchdog_tick(), WatchdogOutcome::Idle);
    }

    #[tokio::test]
    async fn watchdog_recovers_a_stalled_but_locked_session() {
        static COMPLETIONS: CompletionCounter = CompletionCounter::new();
        let mut sup = new_supervisor(&COMPLETIONS);
        sup.start().await.unwrap();
        sup.completion_sink().on_producer_committed();

        let busy = config::BUSY_OR_WAIT_SET[0];
        sup.pib.set_state_for_test(busy);

        // First tick only seeds `prev`; three subsequent stalled ticks (the
        // configured threshold) are required before recovery fires.
        assert_eq!(sup.watchdog_tick(), WatchdogOutcome::Healthy);
        assert_eq!(sup.watchdog_tick(), WatchdogOutcome::Healthy);
        assert_eq!(sup.watchdog_tick(), WatchdogOutcome::Healthy);
        assert_eq!(sup.watchdog_tick(), WatchdogOutcome::Recovered);
        assert_eq!(sup.state(), SessionState::Streaming);
        assert_eq!(sup.streaming_fault_count(), 1);
    }

    #[tokio::test]
    async fn watchdog_caps_recovery_attempts() {
        static COMPLETIONS: CompletionCounter = CompletionCounter::new();
        let mut sup = new_supervisor(&COMPLETIONS);
        sup.start().await.unwrap();
        sup.set_recovery_cap(1);
        sup.completion_sink().on_producer_committed();
        let busy = config::BUSY_OR_WAIT_SET[0];
        sup.pib.set_state_for_test(busy);

        sup.watchdog_tick();
        sup.watchdog_tick();
        sup.watchdog_tick();
        assert_eq!(sup.watchdog_tick(), WatchdogOutcome::Recovered);

        sup.completion_sink().on_producer_committed();
        sup.pib.set_state_for_test(busy);
        sup.watchdog_tick();
        sup.watchdog_tick();
        sup.watchdog_tick();
        assert_eq!(sup.watchdog_tick(), WatchdogOutcome::RecoveryCapped);
        assert_eq!(sup.state(), SessionState::RecoveryCapped);
    }
}
