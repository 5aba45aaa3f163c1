//! User-facing settings: stable keys, first-run defaults and the observer
//! the settings surface calls when a value changes.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, info};

use crate::{
    config::{validate_hostname, SyncConfig, DEFAULT_NTP_SERVER},
    store::SettingsStore,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettingKey {
    SyncEnabled,
    DstEnabled,
    NotifyEnabled,
    NtpServer,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::SyncEnabled,
        SettingKey::DstEnabled,
        SettingKey::NotifyEnabled,
        SettingKey::NtpServer,
    ];

    /// Identifier used in the settings store. Never rename these.
    pub const fn id(self) -> &'static str {
        match self {
            SettingKey::SyncEnabled => "enabledSync",
            SettingKey::DstEnabled => "enabledDST",
            SettingKey::NotifyEnabled => "enabledNotify",
            SettingKey::NtpServer => "ntpServer",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.id() == id)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Text(String),
}

/// Called by the settings surface, one change at a time.
#[async_trait]
pub trait SettingsObserver: Send {
    async fn on_setting_changed(&mut self, key: SettingKey, value: SettingValue) -> Result<()>;
}

/// Owns the live [`SyncConfig`] and keeps it in step with the store.
pub struct Settings<S> {
    store: S,
    config: SyncConfig,
}

impl<S: SettingsStore> Settings<S> {
    /// Reads every setting; anything never written is stored with its default.
    pub async fn load(store: S, defaults: SyncConfig) -> Result<Self> {
        let mut config = defaults;
        for (key, slot) in [
            (SettingKey::SyncEnabled, &mut config.enabled),
            (SettingKey::DstEnabled, &mut config.dst_enabled),
            (SettingKey::NotifyEnabled, &mut config.notify_enabled),
        ] {
            match store.get_bool(key.id()).await? {
                Some(stored) => *slot = stored,
                None => {
                    debug!("setting {key} not found; writing default {}", *slot);
                    store.put_bool(key.id(), *slot).await?;
                }
            }
        }

        let server_id = SettingKey::NtpServer.id();
        match store.get_string(server_id).await? {
            Some(stored) if validate_hostname(&stored).is_ok() => config.server_hostname = stored,
            Some(stored) => {
                info!("stored NTP server {stored:?} is invalid; resetting");
                store.put_string(server_id, &config.server_hostname).await?;
            }
            None => store.put_string(server_id, &config.server_hostname).await?,
        }

        Ok(Settings { store, config })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Timezone is host-derived, not a persisted setting.
    pub fn set_timezone_offset(&mut self, seconds: i32) {
        self.config.timezone_offset_seconds = seconds;
    }

    pub async fn restore_server_default(&mut self) -> Result<()> {
        self.on_setting_changed(
            SettingKey::NtpServer,
            SettingValue::Text(DEFAULT_NTP_SERVER.into()),
        )
        .await
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

#[async_trait]
impl<S: SettingsStore> SettingsObserver for Settings<S> {
    async fn on_setting_changed(&mut self, key: SettingKey, value: SettingValue) -> Result<()> {
        match (key, value) {
            (SettingKey::NtpServer, SettingValue::Text(host)) => {
                validate_hostname(&host)?;
                self.store.put_string(key.id(), &host).await?;
                info!("NTP server set to {host}");
                self.config.server_hostname = host;
            }
            (_, SettingValue::Text(_)) => bail!("{key} expects a boolean"),
            (_, SettingValue::Bool(flag)) => {
                let slot = match key {
                    SettingKey::SyncEnabled => &mut self.config.enabled,
                    SettingKey::DstEnabled => &mut self.config.dst_enabled,
                    SettingKey::NotifyEnabled => &mut self.config.notify_enabled,
                    SettingKey::NtpServer => bail!("{key} expects a hostname"),
                };
                self.store.put_bool(key.id(), flag).await?;
                *slot = flag;
                info!("{key} set to {flag}");
            }
        }
        Ok(())
    }
}
