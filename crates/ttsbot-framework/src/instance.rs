//! The process-wide instance.
//!
//! [`Instance`] is created once, after every backend handle has been acquired,
//! and is passed explicitly (as `Arc<Instance>`) to extensions, the dispatch
//! pipeline and the shutdown path. Nothing looks it up globally.
//!
//! Handles are fixed at construction: there are getters but no setters. Two
//! slots are filled later, each at most once: the per-venue settings store
//! (installed by an extension) and the logged-in identity (set by the runtime
//! when the chat backend becomes ready).

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use ttsbot_core::{
    CacheClient, CurrentUser, DatabasePool, NotificationSink, SettingsStore, SpeechClient,
    UserId, VenueId,
};

use crate::analytics::AnalyticsBuffer;
use crate::channels::NotificationChannels;
use crate::error::SettingsInstallError;
use crate::looper::Looper;

/// The full set of acquired backend handles.
pub struct Resources {
    /// Cache handle.
    pub cache: Arc<dyn CacheClient>,
    /// Database pool handle.
    pub database: Arc<dyn DatabasePool>,
    /// Speech client handle.
    pub speech: Arc<dyn SpeechClient>,
    /// Notification sinks by logical channel.
    pub channels: NotificationChannels,
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources")
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

/// Single owned aggregate of every live backend handle and process-wide state.
pub struct Instance {
    cache: Arc<dyn CacheClient>,
    database: Arc<dyn DatabasePool>,
    speech: Arc<dyn SpeechClient>,
    channels: NotificationChannels,
    trusted: HashSet<UserId>,
    main_venue: VenueId,
    analytics: AnalyticsBuffer,
    settings: OnceLock<Arc<dyn SettingsStore>>,
    current_user: OnceLock<CurrentUser>,
    tasks: TaskTracker,
    shutdown: CancellationToken,
}

impl Instance {
    /// Builds the instance from fully acquired resources.
    pub fn new(
        resources: Resources,
        trusted: impl IntoIterator<Item = UserId>,
        main_venue: VenueId,
    ) -> Self {
        let Resources {
            cache,
            database,
            speech,
            channels,
        } = resources;

        Self {
            cache,
            database,
            speech,
            channels,
            trusted: trusted.into_iter().collect(),
            main_venue,
            analytics: AnalyticsBuffer::new(),
            settings: OnceLock::new(),
            current_user: OnceLock::new(),
            tasks: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    // ─── Backend handles ─────────────────────────────────────────────────────

    /// The cache handle.
    pub fn cache(&self) -> &Arc<dyn CacheClient> {
        &self.cache
    }

    /// The database pool handle.
    pub fn database(&self) -> &Arc<dyn DatabasePool> {
        &self.database
    }

    /// The speech client handle.
    pub fn speech(&self) -> &Arc<dyn SpeechClient> {
        &self.speech
    }

    /// All notification channels.
    pub fn channels(&self) -> &NotificationChannels {
        &self.channels
    }

    /// The operational log channel.
    pub fn logs(&self) -> &Arc<dyn NotificationSink> {
        self.channels.logs()
    }

    // ─── Read-only process state ─────────────────────────────────────────────

    /// Returns `true` if `user` is a trusted operator.
    pub fn is_trusted(&self, user: UserId) -> bool {
        self.trusted.contains(&user)
    }

    /// The trusted operator set.
    pub fn trusted(&self) -> &HashSet<UserId> {
        &self.trusted
    }

    /// The primary coordination venue.
    pub fn main_venue(&self) -> VenueId {
        self.main_venue
    }

    /// The analytics buffer.
    pub fn analytics(&self) -> &AnalyticsBuffer {
        &self.analytics
    }

    /// Records an analytics event.
    pub fn log(&self, event: impl Into<String>) {
        self.analytics.record(event);
    }

    // ─── Install-once slots ──────────────────────────────────────────────────

    /// The per-venue settings store, if an extension installed one.
    pub fn settings(&self) -> Option<&Arc<dyn SettingsStore>> {
        self.settings.get()
    }

    /// Installs the per-venue settings store. Fails if one is already present.
    pub fn install_settings(
        &self,
        store: Arc<dyn SettingsStore>,
    ) -> Result<(), SettingsInstallError> {
        self.settings.set(store).map_err(|_| SettingsInstallError)?;
        debug!("Settings store installed");
        Ok(())
    }

    /// The account the chat backend logged in as, once ready.
    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.current_user.get()
    }

    /// Records the logged-in identity. Returns `false` if already set.
    pub fn set_current_user(&self, user: CurrentUser) -> bool {
        self.current_user.set(user).is_ok()
    }

    // ─── Background tasks ────────────────────────────────────────────────────

    /// Spawns a tracked task that is cancelled at shutdown.
    ///
    /// The future is raced against the instance's cancellation token, so it
    /// does not need to watch for shutdown itself.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.shutdown.clone();
        self.tasks.spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = future => {}
            }
        });
    }

    /// Runs a [`Looper`] on its fixed interval until shutdown.
    ///
    /// The first iteration runs immediately. A failed iteration is logged and
    /// the loop carries on.
    pub fn spawn_looper<L: Looper>(&self, looper: L) {
        info!(looper = L::NAME, interval = ?L::INTERVAL, "Starting looper");
        let token = self.shutdown.clone();
        self.spawn(async move {
            let mut interval = tokio::time::interval(L::INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            while !token.is_cancelled() {
                interval.tick().await;
                if let Err(e) = looper.loop_func().await {
                    error!(looper = L::NAME, error = ?e, "Looper iteration failed");
                }
            }
        });
    }

    /// Number of background tasks still running.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Cancels every background task and waits for them to finish.
    pub async fn stop_tasks(&self) {
        self.shutdown.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }

    /// Returns `true` once [`stop_tasks`](Self::stop_tasks) has been called.
    pub fn is_stopping(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("channels", &self.channels)
            .field("trusted", &self.trusted)
            .field("main_venue", &self.main_venue)
            .field("current_user", &self.current_user.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::testing::{MapSettings, test_instance};

    struct FlakyLooper {
        runs: Arc<AtomicUsize>,
    }

    impl Looper for FlakyLooper {
        const NAME: &'static str = "flaky";
        const INTERVAL: Duration = Duration::from_secs(60);

        async fn loop_func(&self) -> anyhow::Result<()> {
            let run = self.runs.fetch_add(1, Ordering::SeqCst);
            if run % 2 == 0 {
                anyhow::bail!("upstream timed out");
            }
            Ok(())
        }
    }

    #[test]
    fn test_install_once_slots() {
        let instance = test_instance();
        assert!(instance.settings().is_none());

        instance
            .install_settings(Arc::new(MapSettings::default()))
            .unwrap();
        assert!(instance.install_settings(Arc::new(MapSettings::default())).is_err());

        let user = CurrentUser {
            id: UserId::from(42),
            name: "TTS Bot".into(),
        };
        assert!(instance.set_current_user(user.clone()));
        assert!(!instance.set_current_user(user));
        assert_eq!(instance.current_user().map(|u| u.id.get()), Some(42));
    }

    #[test]
    fn test_trusted_and_analytics() {
        let instance = test_instance();
        assert!(!instance.is_trusted(UserId::from(5)));
        assert_eq!(instance.main_venue(), VenueId::from(1));

        instance.log("on_message");
        instance.log("on_message");
        assert_eq!(instance.analytics().drain_counts()["on_message"], 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_looper_survives_failures_until_stopped() {
        let instance = test_instance();
        let runs = Arc::new(AtomicUsize::new(0));
        instance.spawn_looper(FlakyLooper {
            runs: Arc::clone(&runs),
        });
        assert_eq!(instance.task_count(), 1);

        // Ticks at 0s, 60s and 120s.
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        instance.stop_tasks().await;
        assert!(instance.is_stopping());
        assert_eq!(instance.task_count(), 0);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stop_tasks_cancels_pending_work() {
        let instance = test_instance();
        instance.spawn(std::future::pending());
        instance.spawn(async {});

        tokio_test::assert_ok!(
            tokio::time::timeout(Duration::from_secs(1), instance.stop_tasks()).await
        );
        assert_eq!(instance.task_count(), 0);
    }
}
