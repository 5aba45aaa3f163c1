use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

use crate::{
    clock::{set_system_time, ClockAuthority, ClockSource},
    config::SyncConfig,
    error::SyncError,
    net::client::TimeSource,
    time::drift::{Drift, DRIFT_THRESHOLD},
};

pub const UPDATE_MESSAGE: &str = "The time has been changed based on your Internet connection.";

/// User-visible, fire-and-forget notification sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, message: &str) {
        (**self).notify(message)
    }
}

/// Writes notifications to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!("notification: {message}");
    }
}

#[derive(Debug)]
pub enum SyncOutcome {
    /// Sync is disabled.
    Skipped,
    /// Drift within the threshold; nothing touched.
    Unchanged,
    Updated,
    Failed(SyncError),
}

impl SyncOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncOutcome::Failed(_))
    }
}

/// One-shot sync decision. Holds no lock: callers keep at most one
/// `maybe_sync` in flight.
pub struct SyncPolicy<S, C, N> {
    source: S,
    clock: C,
    notifier: N,
    timeout: Duration,
}

impl<S, C, N> SyncPolicy<S, C, N>
where
    S: TimeSource,
    C: ClockSource + ClockAuthority,
    N: Notifier,
{
    pub fn new(source: S, clock: C, notifier: N, timeout: Duration) -> Self {
        SyncPolicy {
            source,
            clock,
            notifier,
            timeout,
        }
    }

    pub async fn maybe_sync(&self, cfg: &SyncConfig) -> SyncOutcome {
        if !cfg.enabled {
            debug!("sync disabled; skipping");
            return SyncOutcome::Skipped;
        }

        let sample = match self
            .source
            .query_time(
                &cfg.server_hostname,
                self.timeout,
                cfg.effective_offset_seconds(),
            )
            .await
        {
            Ok(sample) => sample,
            Err(err) => {
                warn!("time query to {} failed: {err}", cfg.server_hostname);
                return SyncOutcome::Failed(err);
            }
        };

        let rate = self.clock.tick_rate();
        let network = sample.to_ticks(rate);
        let system = self.clock.now();
        let drift = Drift::measure(network, system, rate, DRIFT_THRESHOLD);
        if !drift.exceeds_threshold() {
            debug!("clock within {:.3} ms of network time", drift.as_millis(rate));
            return SyncOutcome::Unchanged;
        }

        if let Err(err) = set_system_time(&self.clock, network) {
            warn!("setting system time failed: {err}");
            return SyncOutcome::Failed(SyncError::Clock(err));
        }
        info!(
            "system time corrected by {:.3} ms from {}",
            drift.as_millis(rate),
            cfg.server_hostname
        );
        if cfg.notify_enabled {
            self.notifier.notify(UPDATE_MESSAGE);
        }
        SyncOutcome::Updated
    }
}
