//! Poll interval schedule.
//!
//! Intervals start at the floor and double up to the ceiling. Jitter is
//! additive and clamped to the ceiling, and each interval is at least the
//! previous one, so the schedule is non-decreasing.

use blok_core::config::DeploymentConfig;
use rand::Rng;
use std::time::Duration;

/// Capped exponential interval for the given attempt (0-based), before jitter.
pub fn capped_exponential(floor: Duration, ceiling: Duration, attempt: u32) -> Duration {
    let floor_ms = floor.as_millis() as u64;
    let ceiling_ms = (ceiling.as_millis() as u64).max(floor_ms);
    let delay_ms = floor_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay_ms.min(ceiling_ms))
}

#[derive(Debug, Clone)]
pub struct PollBackoff {
    floor: Duration,
    ceiling: Duration,
    jitter_ratio: f64,
    attempt: u32,
    last: Duration,
}

impl PollBackoff {
    pub fn new(floor: Duration, ceiling: Duration, jitter_ratio: f64) -> Self {
        Self {
            floor,
            ceiling: ceiling.max(floor),
            jitter_ratio: jitter_ratio.clamp(0.0, 1.0),
            attempt: 0,
            last: Duration::ZERO,
        }
    }

    pub fn from_config(config: &DeploymentConfig) -> Self {
        Self::new(config.poll_floor(), config.poll_ceiling(), config.jitter_ratio)
    }

    pub fn floor(&self) -> Duration {
        self.floor
    }

    /// Next interval with random jitter.
    pub fn next_interval(&mut self) -> Duration {
        let sample = rand::rng().random_range(0.0..1.0);
        self.next_interval_with(sample)
    }

    /// Next interval with a caller-supplied jitter sample in `[0, 1)`.
    pub fn next_interval_with(&mut self, sample: f64) -> Duration {
        let base = capped_exponential(self.floor, self.ceiling, self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        let jitter = base.mul_f64(self.jitter_ratio * sample.clamp(0.0, 1.0));
        let interval = (base + jitter).min(self.ceiling).max(self.last);
        self.last = interval;
        interval
    }
}
