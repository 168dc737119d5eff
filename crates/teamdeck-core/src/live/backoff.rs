//! Reconnect backoff policy

use std::time::Duration;

use crate::config::ReconnectConfig;

/// Capped exponential backoff: `min(initial * 2^attempt, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    initial: Duration,
    max: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(1000),
            max: Duration::from_millis(30_000),
        }
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        Self::new(config.initial_delay, config.max_delay)
    }
}

impl ReconnectPolicy {
    /// Create a policy; a `max` below `initial` is raised to `initial`
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
        }
    }

    /// Delay before reconnecting after `attempt` consecutive failures
    pub fn delay(&self, attempt: u32) -> Duration {
        1u32.checked_shl(attempt)
            .and_then(|factor| self.initial.checked_mul(factor))
            .map_or(self.max, |delay| delay.min(self.max))
    }
}
