use std::time::Duration;

use crate::time::ticks::{TickRate, Ticks};

/// Corrections at or below this are treated as network jitter.
pub const DRIFT_THRESHOLD: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Drift {
    pub ticks: u64,
    pub threshold_ticks: u64,
}

impl Drift {
    pub fn measure(network: Ticks, system: Ticks, rate: TickRate, threshold: Duration) -> Self {
        let threshold_ms = i64::try_from(threshold.as_millis()).unwrap_or(i64::MAX);
        Drift {
            ticks: network.abs_diff(system),
            threshold_ticks: rate.milliseconds_to_ticks(threshold_ms).0.max(0) as u64,
        }
    }

    /// Inclusive: a drift equal to the threshold does not warrant a correction.
    pub fn exceeds_threshold(&self) -> bool {
        self.ticks > self.threshold_ticks
    }

    pub fn as_millis(&self, rate: TickRate) -> f64 {
        self.ticks as f64 * 1_000.0 / rate.per_second() as f64
    }
}
