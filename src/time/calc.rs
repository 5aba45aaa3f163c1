use crate::{
    net::ntp::NtpTimestamp,
    time::ticks::{TickRate, Ticks},
};

/// Seconds between 1900-01-01 (NTP epoch) and 2000-01-01 (device epoch).
pub const NTP_TIMESTAMP_DELTA: i64 = 3_155_673_600;

const NTP_ERA_SECONDS: i64 = 1 << 32;

/// A validated network instant on the device epoch, timezone already applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSample {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl TimeSample {
    pub fn from_ntp(ts: NtpTimestamp, tz_offset_seconds: i32) -> Self {
        TimeSample {
            seconds: era_seconds(ts.seconds) + tz_offset_seconds as i64 - NTP_TIMESTAMP_DELTA,
            nanoseconds: fraction_to_nanos(ts.fraction),
        }
    }

    pub fn to_ticks(&self, rate: TickRate) -> Ticks {
        let whole = rate.seconds_to_ticks(self.seconds);
        let frac = rate.nanoseconds_to_ticks(self.nanoseconds as i64);
        Ticks(whole.0.saturating_add(frac.0))
    }
}

/// Seconds since 1900 on the unbounded timeline. A clear top bit means the
/// counter has wrapped (era 1, from 2036-02-07) as in RFC 4330 section 3.
fn era_seconds(seconds: u32) -> i64 {
    if seconds & 0x8000_0000 == 0 {
        seconds as i64 + NTP_ERA_SECONDS
    } else {
        seconds as i64
    }
}

/// 32-bit binary fraction of a second to nanoseconds.
pub fn fraction_to_nanos(fraction: u32) -> u32 {
    ((fraction as u64 * 1_000_000_000) >> 32) as u32
}
