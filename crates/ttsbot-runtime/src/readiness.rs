//! Readiness Race.
//!
//! ```text
//! Starting ──► Ready ──────────────► Stopped
//!     └──────► FailedBeforeReady ──► Stopped
//! ```
//!
//! The connect-and-serve operation runs as its own task. The race polls it
//! against the [`ReadyWaiter`] and resolves on whichever settles first, with
//! no preference between them. When readiness wins, the serve task keeps
//! running and becomes the main serve loop.

use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

use ttsbot_core::{
    BackendError, BackendKind, BackendResult, ChatBackend, ChatSession, CurrentUser, ReadyWaiter,
};

/// Lifecycle state of the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Startup has begun; readiness not yet known.
    Starting,
    /// The chat backend completed its handshake.
    Ready,
    /// The serve operation ended before readiness.
    FailedBeforeReady,
    /// Shutdown has completed.
    Stopped,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::FailedBeforeReady => "failed before ready",
            Self::Stopped => "stopped",
        })
    }
}

/// Result of the readiness race. Produced once per process.
#[derive(Debug)]
pub enum ReadinessOutcome {
    /// Logged in as the given account.
    Ready(CurrentUser),
    /// The serve operation ended first, with its error if it had one.
    FailedBeforeReady(Option<BackendError>),
}

impl ReadinessOutcome {
    /// Returns `true` for [`ReadinessOutcome::Ready`].
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The account, if ready.
    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            Self::Ready(user) => Some(user),
            Self::FailedBeforeReady(_) => None,
        }
    }

    /// The error that ended the serve operation before readiness.
    pub fn error(&self) -> Option<&BackendError> {
        match self {
            Self::Ready(_) => None,
            Self::FailedBeforeReady(error) => error.as_ref(),
        }
    }
}

/// Handle to the running connect-and-serve task.
pub type ServeTask = JoinHandle<BackendResult<()>>;

/// Starts the connect-and-serve operation on its own task.
pub fn spawn_serve(chat: Arc<dyn ChatBackend>, session: ChatSession) -> ServeTask {
    tokio::spawn(async move { chat.start(session).await })
}

/// Races the serve task against the readiness signal.
///
/// The serve task is borrowed, never cancelled: when readiness wins the
/// caller keeps awaiting it.
pub async fn race(serve: &mut ServeTask, ready: ReadyWaiter) -> ReadinessOutcome {
    tokio::select! {
        user = ready.wait() => {
            debug!(user = %user, "Readiness signalled");
            ReadinessOutcome::Ready(user)
        }
        result = serve => ReadinessOutcome::FailedBeforeReady(serve_error(result)),
    }
}

/// Flattens a finished serve task into its error, if any.
pub(crate) fn serve_error(result: Result<BackendResult<()>, JoinError>) -> Option<BackendError> {
    match result {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e),
        Err(e) => Some(BackendError::unavailable(
            BackendKind::Chat,
            format!("serve task did not complete: {e}"),
        )),
    }
}
