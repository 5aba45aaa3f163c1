//! Periodic "current time" preview shown while the settings surface is open.
//!
//! Reads the network and system clocks, formats them and publishes the text
//! through a watch channel. It never sets the clock.

use std::time::Duration;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{
    clock::ClockSource,
    config::SyncConfig,
    net::client::TimeSource,
    time::calendar::{ntp_line, sys_line, timezone_line},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewLines {
    pub ntp: String,
    pub sys: String,
    pub timezone: String,
}

impl PreviewLines {
    fn loading(offset_seconds: i32) -> Self {
        PreviewLines {
            ntp: "Current NTP Time: Loading...".into(),
            sys: "Current SYS Time: Loading...".into(),
            timezone: timezone_line(offset_seconds),
        }
    }
}

pub struct PreviewHandle {
    stop: watch::Sender<bool>,
    lines: watch::Receiver<PreviewLines>,
    task: JoinHandle<()>,
}

impl PreviewHandle {
    pub fn lines(&self) -> PreviewLines {
        self.lines.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewLines> {
        self.lines.clone()
    }

    /// Signals the task and waits for it to finish.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(err) = self.task.await {
            warn!("preview task ended abnormally: {err}");
        }
    }
}

pub struct PreviewTask;

impl PreviewTask {
    /// `cfg` is a snapshot; reopen the preview to pick up later changes.
    pub fn spawn<S, C>(
        source: S,
        clock: C,
        cfg: SyncConfig,
        timeout: Duration,
        period: Duration,
    ) -> PreviewHandle
    where
        S: TimeSource + 'static,
        C: ClockSource + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let (lines_tx, lines_rx) =
            watch::channel(PreviewLines::loading(cfg.effective_offset_seconds()));

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                let lines = tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    lines = refresh(&source, &clock, &cfg, timeout) => lines,
                };
                lines_tx.send_replace(lines);
            }
            debug!("preview stopped");
        });

        PreviewHandle {
            stop: stop_tx,
            lines: lines_rx,
            task,
        }
    }
}

async fn refresh<S, C>(source: &S, clock: &C, cfg: &SyncConfig, timeout: Duration) -> PreviewLines
where
    S: TimeSource,
    C: ClockSource,
{
    let rate = clock.tick_rate();
    let offset = cfg.effective_offset_seconds();
    let network = match source
        .query_time(&cfg.server_hostname, timeout, offset)
        .await
    {
        Ok(sample) => Some(sample.to_ticks(rate)),
        Err(err) => {
            debug!("preview query failed: {err}");
            None
        }
    };
    PreviewLines {
        ntp: ntp_line(network, rate),
        sys: sys_line(clock.now(), rate),
        timezone: timezone_line(offset),
    }
}
