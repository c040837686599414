//! Redis-backed cache.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::info;

use ttsbot_core::{BackendError, BackendKind, BackendParams, BackendResult, CacheClient};

use crate::params::redis_url;

/// Cache handle over a reconnecting Redis connection.
pub struct RedisCache {
    manager: Mutex<Option<ConnectionManager>>,
}

impl RedisCache {
    /// Connects to the server described by `params`.
    pub async fn connect(params: &BackendParams) -> BackendResult<Self> {
        let url = redis_url(params)?;
        let client = redis::Client::open(url.as_str())
            .map_err(|e| BackendError::rejected(BackendKind::Cache, e.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(unavailable)?;

        info!("Redis cache connected");
        Ok(Self {
            manager: Mutex::new(Some(manager)),
        })
    }

    /// A clone of the live connection, for backend-specific commands.
    pub fn connection(&self) -> BackendResult<ConnectionManager> {
        self.manager.lock().clone().ok_or(BackendError::Closed {
            kind: BackendKind::Cache,
        })
    }
}

fn unavailable(e: redis::RedisError) -> BackendError {
    BackendError::unavailable(BackendKind::Cache, e.to_string())
}

#[async_trait]
impl CacheClient for RedisCache {
    async fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        let mut conn = self.connection()?;
        conn.get(key).await.map_err(unavailable)
    }

    async fn set(&self, key: &str, value: &[u8]) -> BackendResult<()> {
        let mut conn = self.connection()?;
        conn.set::<_, _, ()>(key, value).await.map_err(unavailable)
    }

    async fn close(&self) -> BackendResult<()> {
        // Dropping the last manager clone closes the socket.
        self.manager.lock().take();
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
