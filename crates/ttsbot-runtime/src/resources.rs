//! Resource Initializer.
//!
//! Turns configuration into a fully populated [`Resources`] set or fails
//! without holding anything:
//!
//! 1. Notification sinks are built first. They do no I/O, so a bad webhook
//!    URL or a missing `logs` channel fails before any connection is opened.
//! 2. Cache, database and speech clients are acquired concurrently; startup
//!    latency is that of the slowest one.
//! 3. If any acquisition fails, or shutdown is requested mid-way, the handles
//!    that did succeed are released (bounded by the rollback deadline) before
//!    the error is returned.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use ttsbot_core::{
    BackendFactory, BackendKind, BackendResult, CacheClient, DatabasePool, NotificationSink,
    SpeechClient,
};
use ttsbot_framework::{NotificationChannels, Resources};

use crate::config::TtsBotConfig;
use crate::error::StartupError;

/// Acquires every backend handle as a unit.
pub struct ResourceInitializer {
    factory: Arc<dyn BackendFactory>,
    rollback_timeout: Duration,
}

impl ResourceInitializer {
    /// Creates an initializer. `rollback_timeout` bounds the release of
    /// already acquired handles after a sibling fails or shutdown is requested.
    pub fn new(factory: Arc<dyn BackendFactory>, rollback_timeout: Duration) -> Self {
        Self {
            factory,
            rollback_timeout,
        }
    }

    /// Builds one notification sink per configured webhook.
    pub fn build_channels(
        &self,
        webhooks: &BTreeMap<String, String>,
    ) -> Result<NotificationChannels, StartupError> {
        let mut sinks: BTreeMap<String, Arc<dyn NotificationSink>> = BTreeMap::new();
        for (name, url) in webhooks {
            let sink = self
                .factory
                .create_sink(name, url)
                .map_err(|source| StartupError::Sink {
                    channel: name.clone(),
                    source,
                })?;
            sinks.insert(name.clone(), sink);
        }
        let channels = NotificationChannels::new(sinks)?;
        debug!(channels = ?channels.names().collect::<Vec<_>>(), "Notification channels ready");
        Ok(channels)
    }

    /// Acquires cache, database and speech handles concurrently.
    pub async fn acquire(
        &self,
        config: &TtsBotConfig,
        channels: NotificationChannels,
    ) -> Result<Resources, StartupError> {
        self.acquire_until(config, channels, std::future::pending())
            .await
    }

    /// Like [`acquire`](Self::acquire), but gives up once `cancel` completes.
    ///
    /// Pending acquisitions are dropped and the handles already obtained are
    /// released before [`StartupError::Interrupted`] is returned.
    pub async fn acquire_until(
        &self,
        config: &TtsBotConfig,
        channels: NotificationChannels,
        cancel: impl Future<Output = ()>,
    ) -> Result<Resources, StartupError> {
        let held = Mutex::new(Vec::new());
        let factory = &self.factory;
        let all = async {
            tokio::join!(
                hold(
                    &held,
                    BackendKind::Cache,
                    factory.create_cache(&config.redis),
                    Acquired::Cache,
                ),
                hold(
                    &held,
                    BackendKind::Database,
                    factory.create_database(&config.postgres),
                    Acquired::Database,
                ),
                hold(
                    &held,
                    BackendKind::Speech,
                    factory.create_speech(&config.speech),
                    Acquired::Speech,
                ),
            )
        };

        let results = tokio::select! {
            results = all => results,
            () = cancel => {
                warn!("Shutdown requested while acquiring backends");
                let acquired = std::mem::take(&mut *held.lock());
                self.rollback(acquired).await;
                return Err(StartupError::Interrupted);
            }
        };

        match results {
            (Ok(cache), Ok(database), Ok(speech)) => {
                info!("All backends acquired");
                Ok(Resources {
                    cache,
                    database,
                    speech,
                    channels,
                })
            }
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                self.rollback(held.into_inner()).await;
                Err(StartupError::Backend(e))
            }
        }
    }

    /// Releases already acquired handles after a sibling failed or acquisition was cancelled.
    async fn rollback(&self, acquired: Vec<Acquired>) {
        if acquired.is_empty() {
            return;
        }
        let kinds: Vec<BackendKind> = acquired.iter().map(Acquired::kind).collect();
        warn!(backends = ?kinds, "Rolling back acquired backends");

        let pending = join_all(acquired.into_iter().map(|handle| async move {
            let kind = handle.kind();
            match handle.release().await {
                Ok(()) => debug!(backend = %kind, "Backend released"),
                Err(e) => error!(backend = %kind, error = %e, "Failed to release backend"),
            }
        }));

        if tokio::time::timeout(self.rollback_timeout, pending)
            .await
            .is_err()
        {
            error!(timeout = ?self.rollback_timeout, "Rollback timed out, abandoning releases");
        }
    }
}

/// A handle acquired before acquisition was abandoned.
enum Acquired {
    Cache(Arc<dyn CacheClient>),
    Database(Arc<dyn DatabasePool>),
    Speech(Arc<dyn SpeechClient>),
}

impl Acquired {
    fn kind(&self) -> BackendKind {
        match self {
            Self::Cache(_) => BackendKind::Cache,
            Self::Database(_) => BackendKind::Database,
            Self::Speech(_) => BackendKind::Speech,
        }
    }

    async fn release(self) -> BackendResult<()> {
        match self {
            Self::Cache(handle) => handle.close().await,
            Self::Database(handle) => handle.close().await,
            Self::Speech(handle) => handle.close().await,
        }
    }
}

/// Acquires one handle and, on success, records it for rollback.
async fn hold<T: ?Sized>(
    held: &Mutex<Vec<Acquired>>,
    kind: BackendKind,
    acquire: impl Future<Output = BackendResult<Arc<T>>>,
    wrap: fn(Arc<T>) -> Acquired,
) -> BackendResult<Arc<T>> {
    let handle = traced(kind, acquire).await?;
    held.lock().push(wrap(Arc::clone(&handle)));
    Ok(handle)
}

/// Logs the outcome of one acquisition.
async fn traced<T>(
    kind: BackendKind,
    acquire: impl Future<Output = BackendResult<T>>,
) -> BackendResult<T> {
    let started = tokio::time::Instant::now();
    let result = acquire.await;
    match &result {
        Ok(_) => info!(backend = %kind, elapsed = ?started.elapsed(), "Backend acquired"),
        Err(e) => error!(backend = %kind, error = %e, "Backend acquisition failed"),
    }
    result
}
