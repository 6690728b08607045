use std::thread;
use std::time::Duration;

/// Fixed attempt budget for health checks and liveness polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    interval: Duration,
}

impl RetryPolicy {
    /// Budget used when probing the broker pair after launch.
    pub const HEALTH_CHECK: Self = Self::new(4, Duration::from_secs(1));

    /// Budget used when waiting for a freshly launched node to be observable.
    pub const LIVENESS: Self = Self::new(5, Duration::from_secs(1));

    /// Builds a policy with `attempts` probes spaced by `interval`.
    #[must_use]
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Number of probes.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Pause between probes.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs `probe` until it reports success or the budget is spent.
    ///
    /// The probe receives the one-based attempt number. There is no pause
    /// after the final attempt. Probe errors abort immediately.
    pub fn poll<E, F>(&self, mut probe: F) -> Result<bool, E>
    where
        F: FnMut(u32) -> Result<bool, E>,
    {
        for attempt in 1..=self.attempts {
            if probe(attempt)? {
                return Ok(true);
            }
            if attempt < self.attempts {
                thread::sleep(self.interval);
            }
        }
        Ok(false)
    }
}
