//! Backend factory seam.
//!
//! The resource initializer never constructs handles itself; it asks a
//! [`BackendFactory`]. This keeps the orchestrator independent from any
//! particular client crate and lets tests inject failing or slow backends.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::{CacheClient, DatabasePool, NotificationSink, SpeechClient};
use crate::error::BackendResult;

/// Connection parameters passed verbatim from a configuration section.
pub type BackendParams = serde_json::Map<String, serde_json::Value>;

/// Speech API settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// Override for the API base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// API key, when the provider needs one.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Creates backend handles from configuration.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    /// Connects to the cache.
    async fn create_cache(&self, params: &BackendParams) -> BackendResult<Arc<dyn CacheClient>>;

    /// Opens the database pool.
    async fn create_database(&self, params: &BackendParams)
    -> BackendResult<Arc<dyn DatabasePool>>;

    /// Sets up the speech API client.
    async fn create_speech(&self, settings: &SpeechSettings)
    -> BackendResult<Arc<dyn SpeechClient>>;

    /// Builds a notification sink for one logical channel.
    ///
    /// This must not perform I/O.
    fn create_sink(&self, name: &str, url: &str) -> BackendResult<Arc<dyn NotificationSink>>;
}
