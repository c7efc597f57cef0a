//! Backoff policy for the transparent resend path
//!
//! When the transport breaks mid-exchange the session gets a bounded number
//! of reconnect attempts before the frame is resent. Each attempt doubles
//! the wait, capped and fuzzed so clients restarting together do not hit the
//! exchange in lockstep.

use std::time::Duration;

/// How hard the session tries to re-establish a broken connection
///
/// `max_attempts == 0` disables recovery entirely; the first transport
/// failure then surfaces to the caller.
#[derive(Debug, Clone)]
pub struct ResendPolicy {
    /// Wait before the first reconnect attempt; doubles per attempt
    pub base_delay: Duration,
    /// Ceiling on the doubled wait
    pub max_delay: Duration,
    /// Multiplicative fuzz factor in `0.0..=1.0`
    pub jitter: f64,
    /// Reconnect attempts before giving up
    pub max_attempts: u32,
}

impl Default for ResendPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter: 0.2,
            max_attempts: 3,
        }
    }
}

impl ResendPolicy {
    /// Create a policy with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first-attempt delay
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the delay ceiling
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the fuzz factor
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Set the attempt cap
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Policy that never recovers; failures surface immediately
    pub fn never() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// True while attempt number `attempt` (0-indexed) is still allowed
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Fuzzed wait before reconnect attempt `attempt` (1-indexed)
    pub fn backoff(&self, attempt: u32) -> Duration {
        // doubling saturates well past max_delay for any sane config
        let shift = attempt.saturating_sub(1).min(16);
        let doubled = self.base_delay.saturating_mul(1u32 << shift);
        self.fuzz(doubled.min(self.max_delay))
    }

    fn fuzz(&self, base: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return base;
        }
        // factor in 1.0 ± jitter; never negative because jitter is clamped
        let factor = 1.0 + self.jitter * (rand::random::<f64>() * 2.0 - 1.0);
        base.mul_f64(factor)
    }
}
