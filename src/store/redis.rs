use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::store::{decode_bool, encode_bool, SettingsStore};

/// Settings kept in one Redis hash per namespace (`settings:<namespace>`).
#[derive(Clone)]
pub struct RedisStore {
    inner: Arc<Mutex<MultiplexedConnection>>,
    key: String,
}

impl RedisStore {
    pub async fn connect(url: &str, namespace: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .with_context(|| format!("failed to connect to settings store at {url}"))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(conn)),
            key: hash_key(namespace),
        })
    }

    async fn hget(&self, field: &str) -> Result<Option<String>> {
        let mut conn = self.inner.lock().await;
        let value: Option<String> = conn.hget(&self.key, field).await?;
        Ok(value)
    }

    async fn hset(&self, field: &str, value: &str) -> Result<()> {
        let mut conn = self.inner.lock().await;
        conn.hset::<_, _, _, ()>(&self.key, field, value).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for RedisStore {
    async fn get_bool(&self, id: &str) -> Result<Option<bool>> {
        self.hget(id)
            .await?
            .map(|raw| decode_bool(&raw))
            .transpose()
            .with_context(|| format!("reading {id} from {}", self.key))
    }

    async fn put_bool(&self, id: &str, value: bool) -> Result<()> {
        self.hset(id, encode_bool(value)).await
    }

    async fn get_string(&self, id: &str) -> Result<Option<String>> {
        self.hget(id).await
    }

    async fn put_string(&self, id: &str, value: &str) -> Result<()> {
        self.hset(id, value).await
    }
}

fn hash_key(namespace: &str) -> String {
    format!("settings:{namespace}")
}
