//! Mock backends shared by the lifecycle tests.

#![allow(dead_code)]

use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use ttsbot_core::{
    BackendError, BackendFactory, BackendKind, BackendParams, BackendResult, CacheClient,
    ChatBackend, ChatSession, CurrentUser, DatabasePool, Message, NotificationSink, SpeechClient,
    SpeechSettings, SpeechStatus, UserId, VenueId,
};
use ttsbot_framework::{LOGS_CHANNEL, NotificationChannels, Resources};
use ttsbot_runtime::TtsBotConfig;

/// Ordered log of interesting calls, shared by every mock.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == event).count()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.count(event) > 0
    }
}

/// How a mock handle behaves when closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloseBehavior {
    #[default]
    Ok,
    Fail,
    Hang,
    /// Succeeds after the given delay.
    Slow(Duration),
}

async fn close_with(
    recorder: &Recorder,
    kind: BackendKind,
    behavior: CloseBehavior,
) -> BackendResult<()> {
    recorder.push(format!("close:{kind}"));
    match behavior {
        CloseBehavior::Ok => Ok(()),
        CloseBehavior::Fail => Err(BackendError::unavailable(kind, "connection reset")),
        CloseBehavior::Hang => std::future::pending().await,
        CloseBehavior::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }
}

pub struct MockCache {
    recorder: Recorder,
    close: CloseBehavior,
}

#[async_trait]
impl CacheClient for MockCache {
    async fn get(&self, _key: &str) -> BackendResult<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &[u8]) -> BackendResult<()> {
        Ok(())
    }

    async fn close(&self) -> BackendResult<()> {
        close_with(&self.recorder, BackendKind::Cache, self.close).await
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub struct MockDatabase {
    recorder: Recorder,
    close: CloseBehavior,
}

#[async_trait]
impl DatabasePool for MockDatabase {
    async fn ping(&self) -> BackendResult<()> {
        Ok(())
    }

    async fn close(&self) -> BackendResult<()> {
        close_with(&self.recorder, BackendKind::Database, self.close).await
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub struct MockSpeech {
    recorder: Recorder,
    close: CloseBehavior,
}

#[async_trait]
impl SpeechClient for MockSpeech {
    async fn synthesize(&self, _text: &str, _lang: &str) -> BackendResult<Vec<u8>> {
        Ok(vec![0xFF, 0xF3])
    }

    async fn check(&self) -> BackendResult<SpeechStatus> {
        Ok(SpeechStatus::Available)
    }

    async fn close(&self) -> BackendResult<()> {
        close_with(&self.recorder, BackendKind::Speech, self.close).await
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Records every notice it is asked to deliver.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl RecordingSink {
    /// A sink that takes `delay` to deliver each notice.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, content: &str) -> BackendResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().push(content.to_owned());
        Ok(())
    }
}

/// Builds mock handles; can be told to fail one acquisition.
#[derive(Default)]
pub struct MockFactory {
    pub recorder: Recorder,
    pub logs: Arc<RecordingSink>,
    pub fail: Option<BackendKind>,
    pub close: BTreeMap<BackendKind, CloseBehavior>,
    /// Overrides the per-backend acquisition latency.
    pub acquire_delay: Option<Duration>,
}

impl MockFactory {
    pub fn new(recorder: &Recorder) -> Self {
        Self {
            recorder: recorder.clone(),
            ..Default::default()
        }
    }

    pub fn failing(mut self, kind: BackendKind) -> Self {
        self.fail = Some(kind);
        self
    }

    pub fn close_behavior(mut self, kind: BackendKind, behavior: CloseBehavior) -> Self {
        self.close.insert(kind, behavior);
        self
    }

    pub fn acquire_delay(mut self, delay: Duration) -> Self {
        self.acquire_delay = Some(delay);
        self
    }

    pub fn slow_logs(mut self, delay: Duration) -> Self {
        self.logs = Arc::new(RecordingSink::slow(delay));
        self
    }

    async fn latency(&self, default_ms: u64) {
        let delay = self
            .acquire_delay
            .unwrap_or(Duration::from_millis(default_ms));
        tokio::time::sleep(delay).await;
    }

    fn acquire(&self, kind: BackendKind) -> BackendResult<CloseBehavior> {
        self.recorder.push(format!("acquire:{kind}"));
        if self.fail == Some(kind) {
            return Err(BackendError::unavailable(kind, "connection refused"));
        }
        Ok(self.close.get(&kind).copied().unwrap_or_default())
    }

    /// Handles for a hand-built instance.
    pub fn resources(&self) -> Resources {
        let logs: Arc<dyn NotificationSink> = self.logs.clone();
        Resources {
            cache: Arc::new(MockCache {
                recorder: self.recorder.clone(),
                close: self.close.get(&BackendKind::Cache).copied().unwrap_or_default(),
            }),
            database: Arc::new(MockDatabase {
                recorder: self.recorder.clone(),
                close: self.close.get(&BackendKind::Database).copied().unwrap_or_default(),
            }),
            speech: Arc::new(MockSpeech {
                recorder: self.recorder.clone(),
                close: self.close.get(&BackendKind::Speech).copied().unwrap_or_default(),
            }),
            channels: NotificationChannels::new(BTreeMap::from([(LOGS_CHANNEL.to_string(), logs)]))
                .unwrap(),
        }
    }
}

#[async_trait]
impl BackendFactory for MockFactory {
    async fn create_cache(&self, _params: &BackendParams) -> BackendResult<Arc<dyn CacheClient>> {
        self.latency(3).await;
        let close = self.acquire(BackendKind::Cache)?;
        Ok(Arc::new(MockCache {
            recorder: self.recorder.clone(),
            close,
        }))
    }

    async fn create_database(
        &self,
        _params: &BackendParams,
    ) -> BackendResult<Arc<dyn DatabasePool>> {
        self.latency(1).await;
        let close = self.acquire(BackendKind::Database)?;
        Ok(Arc::new(MockDatabase {
            recorder: self.recorder.clone(),
            close,
        }))
    }

    async fn create_speech(
        &self,
        _settings: &SpeechSettings,
    ) -> BackendResult<Arc<dyn SpeechClient>> {
        self.latency(2).await;
        let close = self.acquire(BackendKind::Speech)?;
        Ok(Arc::new(MockSpeech {
            recorder: self.recorder.clone(),
            close,
        }))
    }

    fn create_sink(&self, name: &str, _url: &str) -> BackendResult<Arc<dyn NotificationSink>> {
        self.recorder.push(format!("sink:{name}"));
        Ok(self.logs.clone())
    }
}

/// What the mock chat backend does once started.
#[derive(Debug, Clone)]
pub enum ChatScript {
    /// Signal ready, deliver the messages, then serve until closed.
    Ready(Vec<Message>),
    /// Fail the handshake.
    FailBeforeReady,
    /// Never complete the handshake; serve until closed.
    NeverReady,
    /// Signal ready, then drop the connection.
    ReadyThenFail,
}

pub struct MockChat {
    recorder: Recorder,
    script: ChatScript,
    close: CloseBehavior,
    closed: Notify,
}

impl MockChat {
    pub fn new(recorder: &Recorder, script: ChatScript) -> Self {
        Self {
            recorder: recorder.clone(),
            script,
            close: CloseBehavior::Ok,
            closed: Notify::new(),
        }
    }

    pub fn close_behavior(mut self, behavior: CloseBehavior) -> Self {
        self.close = behavior;
        self
    }
}

pub fn bot_user() -> CurrentUser {
    CurrentUser {
        id: UserId(513423712582762502),
        name: "TTS Bot".into(),
    }
}

#[async_trait]
impl ChatBackend for MockChat {
    async fn start(&self, session: ChatSession) -> BackendResult<()> {
        self.recorder.push("chat:start");
        match &self.script {
            ChatScript::FailBeforeReady => Err(BackendError::rejected(
                BackendKind::Chat,
                "improper token has been passed",
            )),
            ChatScript::NeverReady => {
                self.closed.notified().await;
                Ok(())
            }
            ChatScript::Ready(messages) => {
                session.ready.notify(bot_user());
                for message in messages {
                    session.dispatcher.dispatch(message.clone()).await;
                }
                self.closed.notified().await;
                Ok(())
            }
            ChatScript::ReadyThenFail => {
                session.ready.notify(bot_user());
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err(BackendError::unavailable(
                    BackendKind::Chat,
                    "gateway connection reset",
                ))
            }
        }
    }

    async fn close(&self) -> BackendResult<()> {
        self.recorder.push("close:chat");
        self.closed.notify_one();
        match self.close {
            CloseBehavior::Ok => Ok(()),
            CloseBehavior::Fail => Err(BackendError::unavailable(
                BackendKind::Chat,
                "already gone",
            )),
            CloseBehavior::Hang => std::future::pending().await,
            CloseBehavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

/// A configuration that passes validation.
pub fn test_config() -> TtsBotConfig {
    let mut config = TtsBotConfig::default();
    config.main.token = "test-token".into();
    config.main.trusted_ids = vec![UserId(1)];
    config.main.main_server = VenueId(693901918342217758);
    config
        .webhooks
        .insert("logs".into(), "https://example.com/logs".into());
    config
}

/// Every backend release the coordinator performs.
pub fn released_backends(recorder: &Recorder) -> HashSet<String> {
    recorder
        .events()
        .into_iter()
        .filter_map(|e| e.strip_prefix("close:").map(str::to_owned))
        .collect()
}
