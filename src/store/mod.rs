//! Persistence seam for the user-facing settings.

pub mod memory;
pub mod redis;

use anyhow::Result;
use async_trait::async_trait;

/// Key/value persistence for settings. `None` means "never written".
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_bool(&self, id: &str) -> Result<Option<bool>>;
    async fn put_bool(&self, id: &str, value: bool) -> Result<()>;
    async fn get_string(&self, id: &str) -> Result<Option<String>>;
    async fn put_string(&self, id: &str, value: &str) -> Result<()>;
}

#[async_trait]
impl<T: SettingsStore + ?Sized> SettingsStore for Box<T> {
    async fn get_bool(&self, id: &str) -> Result<Option<bool>> {
        (**self).get_bool(id).await
    }

    async fn put_bool(&self, id: &str, value: bool) -> Result<()> {
        (**self).put_bool(id, value).await
    }

    async fn get_string(&self, id: &str) -> Result<Option<String>> {
        (**self).get_string(id).await
    }

    async fn put_string(&self, id: &str, value: &str) -> Result<()> {
        (**self).put_string(id, value).await
    }
}

pub(crate) fn encode_bool(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

pub(crate) fn decode_bool(raw: &str) -> Result<bool> {
    match raw.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => anyhow::bail!("stored value {other:?} is not a boolean"),
    }
}
