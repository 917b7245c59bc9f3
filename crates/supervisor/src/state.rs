//! The streaming session's observable lifecycle.
//!
//! `Armed` and `Stopping` from the lifecycle diagram are momentary
//! sub-phases inside [`crate::Supervisor::start`] and
//! [`crate::Supervisor::stop`] — both run to completion with no await point
//! a host request could observe between them, so there is nothing for a
//! caller to read in those phases. Only the states a poll can actually land
//! on are represented here.

/// The streaming session's current lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session. The DMA ring, PIB SM, and bulk endpoint are idle.
    Stopped,
    /// Streaming normally.
    Streaming,
    /// The watchdog detected a wedge and attempted recovery, but the ADC
    /// clock was unlocked at the recheck — waiting on the host to
    /// reprogram the clock before streaming can resume.
    RecoveryAttempt,
    /// The per-session recovery cap has been reached; the watchdog will
    /// not touch hardware again this session. The host must STOP then
    /// START to resume.
    RecoveryCapped,
}

impl SessionState {
    /// True for any state in which the watchdog should keep polling.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Streaming | Self::RecoveryAttempt | Self::RecoveryCapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stopped_is_inactive() {
        assert!(!SessionState::Stopped.is_active());
        assert!(SessionState::Streaming.is_active());
        assert!(SessionState::RecoveryAttempt.is_active());
        assert!(SessionState::RecoveryCapped.is_active());
    }
}
