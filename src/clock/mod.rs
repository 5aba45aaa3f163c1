//! Reading and setting the device clock.
//!
//! The privileged set call is always bracketed by begin/end notifications;
//! other subsystems key off those, so the end notification fires on success,
//! on failure and on unwind.

pub mod realtime;

use std::sync::Arc;
use thiserror::Error;

use crate::time::ticks::{TickRate, Ticks};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    #[error("permission denied (requires root)")]
    PermissionDenied,
    #[error("OS error: {0}")]
    Os(i32),
    #[error("system rejected the new time")]
    Rejected,
    #[error("clock adjustment not supported on this platform")]
    Unsupported,
}

/// Current device time.
pub trait ClockSource: Send + Sync {
    fn tick_rate(&self) -> TickRate;
    fn now(&self) -> Ticks;
}

/// Privileged clock authority of the host.
pub trait ClockAuthority: Send + Sync {
    fn begin_time_change(&self);
    fn set_absolute_system_time(&self, time: Ticks) -> Result<(), ClockError>;
    fn end_time_change(&self);
}

impl<T: ClockSource + ?Sized> ClockSource for Arc<T> {
    fn tick_rate(&self) -> TickRate {
        (**self).tick_rate()
    }

    fn now(&self) -> Ticks {
        (**self).now()
    }
}

impl<T: ClockAuthority + ?Sized> ClockAuthority for Arc<T> {
    fn begin_time_change(&self) {
        (**self).begin_time_change()
    }

    fn set_absolute_system_time(&self, time: Ticks) -> Result<(), ClockError> {
        (**self).set_absolute_system_time(time)
    }

    fn end_time_change(&self) {
        (**self).end_time_change()
    }
}

struct TimeChange<'a, A: ClockAuthority + ?Sized> {
    authority: &'a A,
}

impl<'a, A: ClockAuthority + ?Sized> TimeChange<'a, A> {
    fn begin(authority: &'a A) -> Self {
        authority.begin_time_change();
        TimeChange { authority }
    }
}

impl<A: ClockAuthority + ?Sized> Drop for TimeChange<'_, A> {
    fn drop(&mut self) {
        self.authority.end_time_change();
    }
}

/// Sets the absolute system time. Failures are reported, never retried.
pub fn set_system_time<A: ClockAuthority + ?Sized>(
    authority: &A,
    time: Ticks,
) -> Result<(), ClockError> {
    let _change = TimeChange::begin(authority);
    authority.set_absolute_system_time(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
        fail_with: Option<ClockError>,
        panic: bool,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ClockAuthority for Recorder {
        fn begin_time_change(&self) {
            self.events.lock().unwrap().push("begin".into());
        }

        fn set_absolute_system_time(&self, time: Ticks) -> Result<(), ClockError> {
            self.events.lock().unwrap().push(format!("set {}", time.0));
            if self.panic {
                panic!("firmware call blew up");
            }
            match self.fail_with {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn end_time_change(&self) {
            self.events.lock().unwrap().push("end".into());
        }
    }

    #[test]
    fn brackets_successful_set() {
        let rec = Recorder::default();
        set_system_time(&rec, Ticks(42)).unwrap();
        assert_eq!(rec.events(), ["begin", "set 42", "end"]);
    }

    #[test]
    fn brackets_failed_set() {
        let rec = Recorder {
            fail_with: Some(ClockError::PermissionDenied),
            ..Default::default()
        };
        assert_eq!(
            set_system_time(&rec, Ticks(7)),
            Err(ClockError::PermissionDenied)
        );
        assert_eq!(rec.events(), ["begin", "set 7", "end"]);
    }

    #[test]
    fn brackets_on_unwind() {
        let rec = Recorder {
            panic: true,
            ..Default::default()
        };
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = set_system_time(&rec, Ticks(1));
        }));
        assert!(result.is_err());
        assert_eq!(rec.events(), ["begin", "set 1", "end"]);
    }

    #[test]
    fn error_display() {
        assert_eq!(ClockError::Os(22).to_string(), "OS error: 22");
        assert_eq!(
            ClockError::Unsupported.to_string(),
            "clock adjustment not supported on this platform"
        );
    }
}
