//! Shutdown Coordinator.
//!
//! Runs at most once per process, however many triggers race to start it;
//! later callers wait for the first run and receive the same report.
//!
//! Steps, every one best-effort and started together:
//!
//! - if the account ever became ready, send "`<mention>` is shutting down."
//!   to the `logs` channel,
//! - release the database pool, the cache, the speech client and the chat
//!   connection,
//! - stop extension background tasks.
//!
//! One deadline bounds the whole run. A slow notice never delays a release.
//! Whatever has not finished when the deadline passes is abandoned and
//! reported as such. Individual failures are logged and never escalated.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, info, warn};

use ttsbot_core::{BackendResult, ChatBackend};
use ttsbot_framework::Instance;

/// Why shutdown was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// An extension failed to load; backends are rolled back.
    StartupFailed,
    /// The serve operation ended before readiness.
    FailedBeforeReady,
    /// The serve loop ended after readiness, cleanly or with an error.
    ServeEnded,
    /// An external termination request (signal or shutdown future).
    Requested,
}

/// Something the coordinator releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReleaseTarget {
    Database,
    Cache,
    Speech,
    Chat,
    /// Extension background tasks.
    Tasks,
}

impl ReleaseTarget {
    /// Every target, in report order.
    pub const ALL: [Self; 5] = [
        Self::Database,
        Self::Cache,
        Self::Speech,
        Self::Chat,
        Self::Tasks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Cache => "cache",
            Self::Speech => "speech",
            Self::Chat => "chat",
            Self::Tasks => "tasks",
        }
    }
}

impl std::fmt::Display for ReleaseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one release ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseStatus {
    Released,
    /// The release returned an error.
    Failed(String),
    /// Still running when the deadline passed.
    Abandoned,
}

/// What the shutdown run did.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    /// What started the run.
    pub trigger: ShutdownTrigger,
    /// Whether the shutdown notice reached the `logs` channel.
    pub notice_sent: bool,
    /// Per-target outcome.
    pub releases: BTreeMap<ReleaseTarget, ReleaseStatus>,
    /// Whether the deadline passed before every step finished.
    pub timed_out: bool,
    /// Wall time spent.
    pub elapsed: Duration,
}

impl ShutdownReport {
    /// Outcome for one target.
    pub fn status(&self, target: ReleaseTarget) -> Option<&ReleaseStatus> {
        self.releases.get(&target)
    }

    /// Returns `true` if every target was released.
    pub fn is_clean(&self) -> bool {
        !self.timed_out
            && self
                .releases
                .values()
                .all(|status| *status == ReleaseStatus::Released)
    }
}

/// Exactly-once, deadline-bounded teardown of the instance.
pub struct ShutdownCoordinator {
    instance: Arc<Instance>,
    chat: Arc<dyn ChatBackend>,
    deadline: Duration,
    report: OnceCell<ShutdownReport>,
}

impl ShutdownCoordinator {
    /// Creates a coordinator for `instance`.
    pub fn new(instance: Arc<Instance>, chat: Arc<dyn ChatBackend>, deadline: Duration) -> Self {
        Self {
            instance,
            chat,
            deadline,
            report: OnceCell::new(),
        }
    }

    /// The configured deadline.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Returns `true` once a run has completed.
    pub fn is_done(&self) -> bool {
        self.report.initialized()
    }

    /// Runs the shutdown sequence, or waits for the run already in progress.
    ///
    /// Only the first caller's `trigger` is recorded.
    pub async fn shutdown(&self, trigger: ShutdownTrigger) -> ShutdownReport {
        self.report
            .get_or_init(|| self.execute(trigger))
            .await
            .clone()
    }

    async fn execute(&self, trigger: ShutdownTrigger) -> ShutdownReport {
        info!(?trigger, deadline = ?self.deadline, "Shutting down");
        let started = Instant::now();
        let deadline = started + self.deadline;

        let statuses = Mutex::new(
            ReleaseTarget::ALL
                .into_iter()
                .map(|target| (target, ReleaseStatus::Abandoned))
                .collect::<BTreeMap<_, _>>(),
        );

        let notice_sent = AtomicBool::new(false);
        let instance = &self.instance;
        let steps = async {
            tokio::join!(
                async {
                    if self.send_notice().await {
                        notice_sent.store(true, Ordering::Release);
                    }
                },
                release(&statuses, ReleaseTarget::Database, instance.database().close()),
                release(&statuses, ReleaseTarget::Cache, instance.cache().close()),
                release(&statuses, ReleaseTarget::Speech, instance.speech().close()),
                release(&statuses, ReleaseTarget::Chat, self.chat.close()),
                release(&statuses, ReleaseTarget::Tasks, async {
                    instance.stop_tasks().await;
                    Ok(())
                }),
            );
        };

        let timed_out = timeout_at(deadline, steps).await.is_err();
        let notice_sent = notice_sent.into_inner();

        let releases = statuses.into_inner();
        let abandoned: Vec<ReleaseTarget> = releases
            .iter()
            .filter(|(_, status)| **status == ReleaseStatus::Abandoned)
            .map(|(target, _)| *target)
            .collect();
        if timed_out {
            error!(
                ?abandoned,
                deadline = ?self.deadline,
                "Shutdown deadline elapsed, abandoning remaining steps"
            );
        }

        let report = ShutdownReport {
            trigger,
            notice_sent,
            releases,
            timed_out,
            elapsed: started.elapsed(),
        };
        info!(elapsed = ?report.elapsed, clean = report.is_clean(), "Shutdown complete");
        report
    }

    /// Sends the shutdown notice if the account ever became ready.
    async fn send_notice(&self) -> bool {
        let Some(user) = self.instance.current_user() else {
            debug!("Never became ready, skipping shutdown notice");
            return false;
        };

        let notice = format!("{} is shutting down.", user.mention());
        match self.instance.logs().send(&notice).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to send shutdown notice");
                false
            }
        }
    }
}

impl std::fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("deadline", &self.deadline)
            .field("done", &self.is_done())
            .finish_non_exhaustive()
    }
}

/// Awaits one release and records how it ended.
async fn release(
    statuses: &Mutex<BTreeMap<ReleaseTarget, ReleaseStatus>>,
    target: ReleaseTarget,
    fut: impl Future<Output = BackendResult<()>>,
) {
    let status = match fut.await {
        Ok(()) => {
            debug!(%target, "Released");
            ReleaseStatus::Released
        }
        Err(e) => {
            error!(%target, error = %e, "Release failed");
            ReleaseStatus::Failed(e.to_string())
        }
    };
    statuses.lock().insert(target, status);
}
