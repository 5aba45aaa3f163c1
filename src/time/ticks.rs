//! Native device time: signed ticks since 2000-01-01 00:00:00 at a fixed rate.

const NANOS_PER_SEC: i128 = 1_000_000_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticks(pub i64);

impl Ticks {
    pub fn abs_diff(self, other: Ticks) -> u64 {
        self.0.abs_diff(other.0)
    }
}

/// Ticks per second of a device time base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickRate {
    per_second: u64,
}

impl TickRate {
    pub const NANOSECOND: TickRate = TickRate {
        per_second: 1_000_000_000,
    };

    /// Returns `None` for a zero rate.
    pub const fn new(per_second: u64) -> Option<Self> {
        if per_second == 0 {
            None
        } else {
            Some(TickRate { per_second })
        }
    }

    pub fn per_second(&self) -> u64 {
        self.per_second
    }

    pub fn seconds_to_ticks(&self, seconds: i64) -> Ticks {
        Ticks(saturate(seconds as i128 * self.per_second as i128))
    }

    /// Truncates toward zero.
    pub fn ticks_to_seconds(&self, ticks: Ticks) -> i64 {
        ticks.0 / self.per_second as i64
    }

    pub fn nanoseconds_to_ticks(&self, nanos: i64) -> Ticks {
        Ticks(saturate(
            nanos as i128 * self.per_second as i128 / NANOS_PER_SEC,
        ))
    }

    pub fn ticks_to_nanoseconds(&self, ticks: Ticks) -> i128 {
        ticks.0 as i128 * NANOS_PER_SEC / self.per_second as i128
    }

    pub fn milliseconds_to_ticks(&self, millis: i64) -> Ticks {
        self.nanoseconds_to_ticks(millis.saturating_mul(1_000_000))
    }
}

fn saturate(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
