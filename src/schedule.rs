use std::time::{Duration, Instant};

/// A fixed-period timer polled with an explicit clock reading.
///
/// Each concern (sampling, counters, process list, charts) gets its own
/// `Ticker`, so a late poll fires once and re-anchors instead of firing
/// repeatedly to catch up.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    /// First fire one period after `now`
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next: now + period,
        }
    }

    /// First fire on the first poll
    pub fn immediate(period: Duration, now: Instant) -> Self {
        Self { period, next: now }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn set_period(&mut self, period: Duration, now: Instant) {
        if period != self.period {
            self.period = period;
            self.next = self.next.min(now + period);
        }
    }

    pub fn should_update(&self, now: Instant) -> bool {
        now >= self.next
    }

    /// Returns whether the period has elapsed and schedules the next fire
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.should_update(now) {
            return false;
        }
        let next = self.next + self.period;
        self.next = if next <= now { now + self.period } else { next };
        true
    }

    /// Makes the ticker due right away
    pub fn reset(&mut self, now: Instant) {
        self.next = now;
    }

    /// Time left until the next fire
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }
}
