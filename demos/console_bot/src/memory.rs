//! In-process stand-ins for the external backends.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use ttsbot::core::{
    BackendFactory, BackendParams, CacheClient, DatabasePool, NotificationSink, SpeechClient,
    SpeechSettings, SpeechStatus,
};
use ttsbot::prelude::*;

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl CacheClient for MemoryCache {
    async fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> BackendResult<()> {
        self.entries.lock().insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    async fn close(&self) -> BackendResult<()> {
        self.entries.lock().clear();
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub struct MemoryDatabase;

#[async_trait]
impl DatabasePool for MemoryDatabase {
    async fn ping(&self) -> BackendResult<()> {
        Ok(())
    }

    async fn close(&self) -> BackendResult<()> {
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// "Synthesizes" by echoing the UTF-8 text back.
pub struct EchoSpeech;

#[async_trait]
impl SpeechClient for EchoSpeech {
    async fn synthesize(&self, text: &str, lang: &str) -> BackendResult<Vec<u8>> {
        debug!(lang, "Echo speech");
        Ok(text.as_bytes().to_vec())
    }

    async fn check(&self) -> BackendResult<SpeechStatus> {
        Ok(SpeechStatus::Available)
    }

    async fn close(&self) -> BackendResult<()> {
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Writes notices to the log instead of a webhook.
pub struct LogSink {
    channel: String,
}

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, content: &str) -> BackendResult<()> {
        info!(channel = %self.channel, "{content}");
        Ok(())
    }
}

pub struct MemoryFactory;

#[async_trait]
impl BackendFactory for MemoryFactory {
    async fn create_cache(&self, _params: &BackendParams) -> BackendResult<Arc<dyn CacheClient>> {
        Ok(Arc::new(MemoryCache::default()))
    }

    async fn create_database(
        &self,
        _params: &BackendParams,
    ) -> BackendResult<Arc<dyn DatabasePool>> {
        Ok(Arc::new(MemoryDatabase))
    }

    async fn create_speech(
        &self,
        _settings: &SpeechSettings,
    ) -> BackendResult<Arc<dyn SpeechClient>> {
        Ok(Arc::new(EchoSpeech))
    }

    fn create_sink(&self, name: &str, _url: &str) -> BackendResult<Arc<dyn NotificationSink>> {
        Ok(Arc::new(LogSink {
            channel: name.to_owned(),
        }))
    }
}
