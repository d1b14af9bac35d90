use std::time::Duration;

/// Shape of the throttling backoff.
///
/// The interval starts at `initial`, grows by `step` while it is below
/// `knee`, then grows by `coarse_step`. `max` optionally clamps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub step: Duration,
    pub knee: Duration,
    pub coarse_step: Duration,
    pub max: Option<Duration>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(1000),
            step: Duration::from_millis(1000),
            knee: Duration::from_millis(5000),
            coarse_step: Duration::from_millis(5000),
            max: None,
        }
    }
}

/// Delay sequence for one throttled call. Never decreases.
#[derive(Debug, Clone)]
pub struct ThrottleBackoff {
    policy: BackoffPolicy,
    current: Duration,
    attempts: u32,
}

impl ThrottleBackoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        let current = clamp(policy.initial, policy.max);
        Self {
            policy,
            current,
            attempts: 0,
        }
    }

    /// Number of delays handed out so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the delay to wait now and advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let increment = if self.current < self.policy.knee {
            self.policy.step
        } else {
            self.policy.coarse_step
        };
        self.current = clamp(self.current.saturating_add(increment), self.policy.max).max(delay);
        self.attempts = self.attempts.saturating_add(1);
        delay
    }
}

impl Iterator for ThrottleBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_delay())
    }
}

fn clamp(delay: Duration, max: Option<Duration>) -> Duration {
    match max {
        Some(max) => delay.min(max),
        None => delay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(backoff: ThrottleBackoff, n: usize) -> Vec<u64> {
        backoff.take(n).map(|d| d.as_millis() as u64).collect()
    }

    #[test]
    fn default_schedule_switches_to_coarse_steps_at_five_seconds() {
        let backoff = ThrottleBackoff::new(BackoffPolicy::default());
        assert_eq!(
            millis(backoff, 8),
            vec![1000, 2000, 3000, 4000, 5000, 10000, 15000, 20000]
        );
    }

    #[test]
    fn capped_schedule_plateaus() {
        let policy = BackoffPolicy {
            max: Some(Duration::from_millis(5000)),
            ..Default::default()
        };
        let backoff = ThrottleBackoff::new(policy);
        assert_eq!(
            millis(backoff, 8),
            vec![1000, 2000, 3000, 4000, 5000, 5000, 5000, 5000]
        );
    }

    #[test]
    fn schedule_never_decreases() {
        for max in [None, Some(Duration::from_millis(2500)), Some(Duration::from_millis(500))] {
            let policy = BackoffPolicy {
                max,
                ..Default::default()
            };
            let delays: Vec<Duration> = ThrottleBackoff::new(policy).take(50).collect();
            assert!(delays.windows(2).all(|w| w[0] <= w[1]), "max={max:?}");
        }
    }

    #[test]
    fn attempts_are_counted() {
        let mut backoff = ThrottleBackoff::new(BackoffPolicy::default());
        assert_eq!(backoff.attempts(), 0);
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.attempts(), 2);
    }
}
