use chrono::{Datelike, Local, NaiveDate, Offset, TimeZone};
use serde::Deserialize;
use std::{fs, path::Path};

pub const DEFAULT_NTP_SERVER: &str = "pool.ntp.org";
/// Hostname field is 32 bytes including the terminator on the device side.
pub const MAX_HOSTNAME_LEN: usize = 31;

const DST_SHIFT_SECONDS: i32 = 3_600;
const DEFAULT_TIMEOUT_MS: u64 = 1_500;
const DEFAULT_PREVIEW_INTERVAL_MS: u64 = 1_000;

/// Per-attempt input to the sync core. The core never mutates it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    pub enabled: bool,
    pub dst_enabled: bool,
    pub notify_enabled: bool,
    pub timezone_offset_seconds: i32,
    pub server_hostname: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            enabled: false,
            dst_enabled: false,
            notify_enabled: true,
            timezone_offset_seconds: 0,
            server_hostname: DEFAULT_NTP_SERVER.into(),
        }
    }
}

impl SyncConfig {
    /// Standard offset plus one hour while daylight saving is on.
    pub fn effective_offset_seconds(&self) -> i32 {
        if self.dst_enabled {
            self.timezone_offset_seconds.saturating_add(DST_SHIFT_SECONDS)
        } else {
            self.timezone_offset_seconds
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DefaultsCfg {
    #[serde(default)]
    pub sync_enabled: bool,
    #[serde(default)]
    pub dst_enabled: bool,
    #[serde(default = "default_true")]
    pub notify_enabled: bool,
    #[serde(default = "default_server")]
    pub ntp_server: String,
}

impl Default for DefaultsCfg {
    fn default() -> Self {
        DefaultsCfg {
            sync_enabled: false,
            dst_enabled: false,
            notify_enabled: true,
            ntp_server: default_server(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PreviewCfg {
    /// Refresh cadence of the preview lines (milliseconds).
    #[serde(default = "default_preview_interval")]
    pub interval_ms: u64,
    /// How long the daemon keeps the preview open; 0 skips it.
    #[serde(default)]
    pub open_secs: u64,
}

impl Default for PreviewCfg {
    fn default() -> Self {
        PreviewCfg {
            interval_ms: default_preview_interval(),
            open_secs: 0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Namespace for persisted settings.
    #[serde(default = "default_namespace")]
    pub storage_namespace: String,
    /// Settings live in memory only when unset.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Standard-time UTC offset; taken from the host when absent.
    #[serde(default)]
    pub timezone_offset_seconds: Option<i32>,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub defaults: DefaultsCfg,
    #[serde(default)]
    pub preview: PreviewCfg,
}

impl Config {
    /// First-run values for the persisted settings.
    pub fn initial_sync_config(&self) -> SyncConfig {
        SyncConfig {
            enabled: self.defaults.sync_enabled,
            dst_enabled: self.defaults.dst_enabled,
            notify_enabled: self.defaults.notify_enabled,
            timezone_offset_seconds: self.timezone_offset_seconds.unwrap_or(0),
            server_hostname: self.defaults.ntp_server.clone(),
        }
    }
}

pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let buf = fs::read_to_string(path)?;
    parse(&buf)
}

pub fn parse(buf: &str) -> anyhow::Result<Config> {
    Ok(toml::from_str::<Config>(buf)?)
}

pub fn ensure_defaults(cfg: &mut Config) {
    if cfg.timezone_offset_seconds.is_none() {
        let offset = host_standard_offset();
        tracing::info!("no timezone offset configured; using host standard offset {offset:+}s");
        cfg.timezone_offset_seconds = Some(offset);
    }
    if let Err(err) = validate_hostname(&cfg.defaults.ntp_server) {
        tracing::warn!(
            "default NTP server {:?} rejected ({err}); using {}",
            cfg.defaults.ntp_server,
            DEFAULT_NTP_SERVER
        );
        cfg.defaults.ntp_server = DEFAULT_NTP_SERVER.into();
    }
    if cfg.timeout_ms == 0 {
        cfg.timeout_ms = DEFAULT_TIMEOUT_MS;
    }
    cfg.preview.interval_ms = cfg.preview.interval_ms.max(100);
}

/// Host UTC offset with daylight saving taken out.
pub fn host_standard_offset() -> i32 {
    let now = Local::now();
    standard_offset(&Local, now.year()).unwrap_or_else(|| now.offset().local_minus_utc())
}

/// Summer time only ever moves clocks forward, so the smaller of the midwinter
/// and midsummer offsets is the standard one in either hemisphere.
pub fn standard_offset<Tz: TimeZone>(tz: &Tz, year: i32) -> Option<i32> {
    [(1, 1), (7, 1)]
        .into_iter()
        .map(|(month, day)| {
            let noon = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(12, 0, 0)?;
            Some(tz.offset_from_utc_datetime(&noon).fix().local_minus_utc())
        })
        .try_fold(i32::MAX, |min, offset| Some(min.min(offset?)))
}

pub fn validate_hostname(host: &str) -> anyhow::Result<()> {
    if host.is_empty() {
        anyhow::bail!("hostname is empty");
    }
    if host.len() > MAX_HOSTNAME_LEN {
        anyhow::bail!(
            "hostname is {} bytes, at most {MAX_HOSTNAME_LEN} allowed",
            host.len()
        );
    }
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':'))
    {
        anyhow::bail!("hostname contains invalid characters");
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

fn default_server() -> String {
    DEFAULT_NTP_SERVER.into()
}

fn default_namespace() -> String {
    "clocksync".into()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_preview_interval() -> u64 {
    DEFAULT_PREVIEW_INTERVAL_MS
}
