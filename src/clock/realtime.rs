use nix::{
    errno::Errno,
    sys::time::TimeSpec,
    time::{clock_gettime, ClockId},
};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::{
    clock::{ClockAuthority, ClockError, ClockSource},
    time::ticks::{TickRate, Ticks},
};

/// Unix seconds at 2000-01-01 00:00:00 UTC.
const UNIX_TO_2000: i64 = 946_684_800;
const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Host `CLOCK_REALTIME` seen as a device clock that keeps local time on the
/// 2000 epoch, one tick per nanosecond.
#[derive(Clone, Debug)]
pub struct RealtimeClock {
    utc_offset_seconds: i32,
}

impl RealtimeClock {
    pub fn new(utc_offset_seconds: i32) -> Self {
        RealtimeClock { utc_offset_seconds }
    }

    fn unix_now_ns(&self) -> i128 {
        match clock_gettime(ClockId::CLOCK_REALTIME) {
            Ok(ts) => timespec_to_ns(&ts),
            Err(err) => {
                static WARN_ONCE: OnceCell<()> = OnceCell::new();
                WARN_ONCE.get_or_init(|| {
                    warn!("clock_gettime failed; falling back to SystemTime: {err}");
                });
                system_time_ns()
            }
        }
    }
}

impl ClockSource for RealtimeClock {
    fn tick_rate(&self) -> TickRate {
        TickRate::NANOSECOND
    }

    fn now(&self) -> Ticks {
        unix_ns_to_device(self.unix_now_ns(), self.utc_offset_seconds)
    }
}

impl ClockAuthority for RealtimeClock {
    fn begin_time_change(&self) {
        info!("system time change starting");
    }

    fn set_absolute_system_time(&self, time: Ticks) -> Result<(), ClockError> {
        let unix_ns = device_to_unix_ns(time, self.utc_offset_seconds);
        platform::settime(unix_ns)
    }

    fn end_time_change(&self) {
        info!("system time change finished");
    }
}

fn unix_ns_to_device(unix_ns: i128, utc_offset_seconds: i32) -> Ticks {
    let shift = (utc_offset_seconds as i128 - UNIX_TO_2000 as i128) * NANOS_PER_SEC;
    Ticks((unix_ns + shift).clamp(i64::MIN as i128, i64::MAX as i128) as i64)
}

fn device_to_unix_ns(time: Ticks, utc_offset_seconds: i32) -> i128 {
    let shift = (utc_offset_seconds as i128 - UNIX_TO_2000 as i128) * NANOS_PER_SEC;
    time.0 as i128 - shift
}

fn timespec_to_ns(ts: &TimeSpec) -> i128 {
    ts.tv_sec() as i128 * NANOS_PER_SEC + ts.tv_nsec() as i128
}

fn system_time_ns() -> i128 {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(d) => d.as_nanos() as i128,
        Err(err) => -(err.duration().as_nanos() as i128),
    }
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn clock_error(errno: Errno) -> ClockError {
    match errno {
        Errno::EPERM => ClockError::PermissionDenied,
        Errno::ENOSYS => ClockError::Unsupported,
        Errno::EINVAL => ClockError::Rejected,
        other => ClockError::Os(other as i32),
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use super::*;
    use nix::time::clock_settime;

    pub(super) fn settime(unix_ns: i128) -> Result<(), ClockError> {
        let secs = unix_ns.div_euclid(NANOS_PER_SEC);
        let nanos = unix_ns.rem_euclid(NANOS_PER_SEC);
        let secs = i64::try_from(secs).map_err(|_| ClockError::Rejected)?;
        let ts = TimeSpec::new(secs as _, nanos as _);
        clock_settime(ClockId::CLOCK_REALTIME, ts).map_err(clock_error)
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use super::*;

    pub(super) fn settime(_unix_ns: i128) -> Result<(), ClockError> {
        tracing::debug!("setting CLOCK_REALTIME not supported on this platform");
        Err(ClockError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_epoch_2000_maps_to_zero() {
        let unix_ns = UNIX_TO_2000 as i128 * NANOS_PER_SEC;
        assert_eq!(unix_ns_to_device(unix_ns, 0), Ticks(0));
        assert_eq!(
            unix_ns_to_device(unix_ns, 3_600),
            Ticks(3_600 * 1_000_000_000)
        );
    }

    #[test]
    fn device_and_unix_round_trip_with_offset() {
        let unix_ns = 1_700_000_000_123_456_789i128;
        for offset in [-36_000, 0, 19_800] {
            let ticks = unix_ns_to_device(unix_ns, offset);
            assert_eq!(device_to_unix_ns(ticks, offset), unix_ns);
        }
    }

    #[test]
    fn now_tracks_system_time() {
        let clock = RealtimeClock::new(0);
        let from_clock = clock.now();
        let expected = unix_ns_to_device(system_time_ns(), 0);
        assert!(from_clock.abs_diff(expected) < 5_000_000_000);
        assert_eq!(clock.tick_rate(), TickRate::NANOSECOND);
    }

    #[test]
    fn errno_mapping() {
        assert_eq!(clock_error(Errno::EPERM), ClockError::PermissionDenied);
        assert_eq!(clock_error(Errno::ENOSYS), ClockError::Unsupported);
        assert_eq!(clock_error(Errno::EINVAL), ClockError::Rejected);
        assert_eq!(clock_error(Errno::EIO), ClockError::Os(Errno::EIO as i32));
    }
}
