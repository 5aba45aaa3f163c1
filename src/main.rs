use anyhow::Context;
use clocksync::{
    clock::realtime::RealtimeClock,
    config::{ensure_defaults, load},
    settings::Settings,
    store::{memory::MemoryStore, redis::RedisStore, SettingsStore},
    LogNotifier, NtpClient, PreviewTask, SyncOutcome, SyncPolicy,
};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();
    let path = std::env::var("CONFIG").unwrap_or_else(|_| "config/clocksync.toml".into());
    let mut cfg = load(&path).with_context(|| format!("failed to load config from {path}"))?;
    ensure_defaults(&mut cfg);

    let store: Box<dyn SettingsStore> = match &cfg.redis_url {
        Some(url) => Box::new(RedisStore::connect(url, &cfg.storage_namespace).await?),
        None => {
            info!("no redis_url configured; settings are kept in memory");
            Box::new(MemoryStore::new())
        }
    };
    let settings = Settings::load(store, cfg.initial_sync_config()).await?;

    let sync_cfg = settings.config().clone();
    let clock = Arc::new(RealtimeClock::new(sync_cfg.effective_offset_seconds()));
    let source = Arc::new(NtpClient::new());
    let timeout = Duration::from_millis(cfg.timeout_ms);
    let policy = SyncPolicy::new(source.clone(), clock.clone(), LogNotifier, timeout);

    report(policy.maybe_sync(&sync_cfg).await);

    if cfg.preview.open_secs > 0 {
        let preview = PreviewTask::spawn(
            source,
            clock,
            sync_cfg.clone(),
            timeout,
            Duration::from_millis(cfg.preview.interval_ms),
        );
        let mut lines = preview.subscribe();
        let open_for = tokio::time::sleep(Duration::from_secs(cfg.preview.open_secs));
        tokio::pin!(open_for);
        loop {
            tokio::select! {
                _ = &mut open_for => break,
                changed = lines.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = lines.borrow_and_update().clone();
                    info!("{} | {} | {}", current.ntp, current.sys, current.timezone);
                }
            }
        }
        preview.stop().await;

        // settings surface closed: sync again with whatever is current
        report(policy.maybe_sync(settings.config()).await);
    }
    Ok(())
}

fn report(outcome: SyncOutcome) {
    match outcome {
        SyncOutcome::Skipped => info!("time sync disabled"),
        SyncOutcome::Unchanged => info!("clock already in sync"),
        SyncOutcome::Updated => info!("clock updated"),
        SyncOutcome::Failed(err) => warn!("time sync failed: {err}"),
    }
}
