//! Readiness handshake between the chat backend and the orchestrator.
//!
//! The backend owns a [`ReadySignal`] and calls [`ReadySignal::notify`] once its
//! login handshake succeeds. The orchestrator awaits the matching
//! [`ReadyWaiter`]. If the backend drops the signal without notifying (it gave
//! up before reaching readiness), the waiter never resolves; the orchestrator
//! learns about the failure from the backend's own return value instead.

use tokio::sync::watch;
use tracing::debug;

use crate::chat::CurrentUser;

/// Creates a connected signal/waiter pair.
pub fn ready_pair() -> (ReadySignal, ReadyWaiter) {
    let (tx, rx) = watch::channel(None);
    (ReadySignal { tx }, ReadyWaiter { rx })
}

/// Sending half, handed to the chat backend.
#[derive(Debug)]
pub struct ReadySignal {
    tx: watch::Sender<Option<CurrentUser>>,
}

impl ReadySignal {
    /// Reports a successful handshake. Only the first call has an effect.
    pub fn notify(&self, user: CurrentUser) {
        let notified = self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(user);
            true
        });
        if !notified {
            debug!("Ready signal already sent, ignoring repeat");
        }
    }

    /// Returns `true` once [`notify`](Self::notify) has been called.
    pub fn is_ready(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

/// Receiving half, awaited by the orchestrator.
#[derive(Debug, Clone)]
pub struct ReadyWaiter {
    rx: watch::Receiver<Option<CurrentUser>>,
}

impl ReadyWaiter {
    /// Resolves with the logged-in identity once the backend is ready.
    ///
    /// Pends forever if the signal is dropped without being notified.
    pub async fn wait(mut self) -> CurrentUser {
        let user = match self.rx.wait_for(Option::is_some).await {
            Ok(user) => user.clone(),
            Err(_) => None,
        };
        match user {
            Some(user) => user,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::message::UserId;

    fn user() -> CurrentUser {
        CurrentUser {
            id: UserId(42),
            name: "TTS Bot".to_string(),
        }
    }

    #[tokio::test]
    async fn test_waiter_resolves_after_notify() {
        let (signal, waiter) = ready_pair();
        let handle = tokio::spawn(waiter.wait());
        signal.notify(user());
        let got = handle.await.unwrap();
        assert_eq!(got.id, UserId(42));
        assert!(signal.is_ready());
    }

    #[tokio::test]
    async fn test_second_notify_is_ignored() {
        let (signal, waiter) = ready_pair();
        signal.notify(user());
        signal.notify(CurrentUser {
            id: UserId(7),
            name: "other".to_string(),
        });
        assert_eq!(waiter.wait().await.id, UserId(42));
    }

    #[tokio::test]
    async fn test_dropped_signal_never_resolves() {
        let (signal, waiter) = ready_pair();
        drop(signal);
        let result = tokio::time::timeout(Duration::from_millis(20), waiter.wait()).await;
        assert!(result.is_err());
    }
}
