use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::store::{decode_bool, encode_bool, SettingsStore};

/// Process-local store; settings are lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.values.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.lock().await.is_empty()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_bool(&self, id: &str) -> Result<Option<bool>> {
        let guard = self.values.lock().await;
        guard.get(id).map(|raw| decode_bool(raw)).transpose()
    }

    async fn put_bool(&self, id: &str, value: bool) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(id.to_string(), encode_bool(value).to_string());
        Ok(())
    }

    async fn get_string(&self, id: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(id).cloned())
    }

    async fn put_string(&self, id: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(id.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_keys_are_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get_bool("enabledSync").await.unwrap(), None);
        assert_eq!(store.get_string("ntpServer").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn stores_values() {
        let store = MemoryStore::new();
        store.put_bool("enabledSync", true).await.unwrap();
        store.put_string("ntpServer", "fritz.box").await.unwrap();
        assert_eq!(store.get_bool("enabledSync").await.unwrap(), Some(true));
        assert_eq!(
            store.get_string("ntpServer").await.unwrap().as_deref(),
            Some("fritz.box")
        );
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn garbage_bool_is_an_error() {
        let store = MemoryStore::new();
        store.put_string("enabledSync", "maybe").await.unwrap();
        assert!(store.get_bool("enabledSync").await.is_err());
    }
}
