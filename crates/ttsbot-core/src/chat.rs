//! Chat backend seam.
//!
//! The wire protocol of the chat service is not modelled here. A
//! [`ChatBackend`] receives a [`ChatSession`] describing how to log in and
//! where to deliver incoming messages, and is expected to:
//!
//! 1. perform its login handshake,
//! 2. call [`ReadySignal::notify`](crate::ReadySignal::notify) with the
//!    logged-in identity,
//! 3. serve until the connection ends or [`ChatBackend::close`] is called.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendResult;
use crate::message::{Message, UserId};
use crate::ready::ReadySignal;

/// The account the bot logged in as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// Account identifier.
    pub id: UserId,
    /// Account name.
    pub name: String,
}

impl CurrentUser {
    /// Returns the chat mention for this account.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

impl std::fmt::Display for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// What the presence line says the bot is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// "Playing …"
    Playing,
    /// "Streaming …"
    Streaming,
    /// "Listening to …"
    #[default]
    Listening,
    /// "Watching …"
    Watching,
    /// "Competing in …"
    Competing,
}

/// Online status shown next to the bot account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnlineStatus {
    /// Online.
    #[default]
    Online,
    /// Idle.
    Idle,
    /// Do not disturb.
    Dnd,
    /// Shown as offline.
    Invisible,
}

/// Presence announced during login.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Presence {
    /// Activity text.
    pub name: String,
    /// Activity kind.
    #[serde(rename = "type", default)]
    pub kind: ActivityKind,
    /// Online status.
    #[serde(default)]
    pub status: OnlineStatus,
}

/// Receives messages from the chat backend.
///
/// Implementations must not block for long: the backend awaits `dispatch`
/// inline, so slow work should be spawned.
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    /// Handles one incoming message.
    async fn dispatch(&self, message: Message);
}

/// Everything a chat backend needs to log in and serve.
pub struct ChatSession {
    /// Service-account token.
    pub token: String,
    /// Presence to announce.
    pub presence: Presence,
    /// Fired once after a successful handshake.
    pub ready: ReadySignal,
    /// Destination for incoming messages.
    pub dispatcher: Arc<dyn MessageDispatcher>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("presence", &self.presence)
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}

/// Connection to the external chat service.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Logs in, signals readiness, then serves until the connection ends.
    ///
    /// Returning `Ok(())` means the serve loop ended cleanly (usually because
    /// [`close`](Self::close) was called).
    async fn start(&self, session: ChatSession) -> BackendResult<()>;

    /// Disconnects from the chat service, ending a running `start`.
    async fn close(&self) -> BackendResult<()>;
}
