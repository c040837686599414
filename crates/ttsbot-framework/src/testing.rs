//! In-memory backends for unit tests.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use ttsbot_core::{
    BackendError, BackendKind, BackendResult, CacheClient, DatabasePool, NotificationSink,
    SettingsStore, SpeechClient, SpeechStatus, VenueId,
};

use crate::channels::{LOGS_CHANNEL, NotificationChannels};
use crate::instance::{Instance, Resources};

pub(crate) struct NullCache;

#[async_trait]
impl CacheClient for NullCache {
    async fn get(&self, _key: &str) -> BackendResult<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &[u8]) -> BackendResult<()> {
        Ok(())
    }

    async fn close(&self) -> BackendResult<()> {
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub(crate) struct NullDatabase;

#[async_trait]
impl DatabasePool for NullDatabase {
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

pub(crate) struct NullSpeech;

#[async_trait]
impl SpeechClient for NullSpeech {
    async fn synthesize(&self, _text: &str, _lang: &str) -> BackendResult<Vec<u8>> {
        Ok(Vec::new())
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

#[derive(Default)]
pub(crate) struct RecordingSink {
    pub(crate) sent: Mutex<Vec<String>>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, content: &str) -> BackendResult<()> {
        self.sent.lock().push(content.to_owned());
        Ok(())
    }
}

/// Settings keyed by venue; venues listed in `failing` return an error.
#[derive(Default)]
pub(crate) struct MapSettings {
    pub(crate) prefixes: HashMap<VenueId, String>,
    pub(crate) failing: Vec<VenueId>,
}

#[async_trait]
impl SettingsStore for MapSettings {
    async fn venue_prefix(&self, venue: VenueId) -> BackendResult<Option<String>> {
        if self.failing.contains(&venue) {
            return Err(BackendError::unavailable(
                BackendKind::Settings,
                "settings table unreachable",
            ));
        }
        Ok(self.prefixes.get(&venue).cloned())
    }
}

pub(crate) fn test_instance() -> Arc<Instance> {
    let logs: Arc<dyn NotificationSink> = Arc::new(RecordingSink::default());
    let channels = NotificationChannels::new(BTreeMap::from([(LOGS_CHANNEL.to_owned(), logs)]))
        .expect("logs channel present");
    let resources = Resources {
        cache: Arc::new(NullCache),
        database: Arc::new(NullDatabase),
        speech: Arc::new(NullSpeech),
        channels,
    };
    Arc::new(Instance::new(resources, [], VenueId::from(1)))
}
