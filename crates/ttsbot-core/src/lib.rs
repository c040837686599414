//! # TTS Bot Core
//!
//! Contracts shared by every layer of the bot:
//!
//! - Backend handle traits ([`CacheClient`], [`DatabasePool`], [`SpeechClient`],
//!   [`NotificationSink`]) and the [`BackendFactory`] that creates them
//! - The chat backend seam ([`ChatBackend`], [`ChatSession`], [`MessageDispatcher`])
//! - The readiness handshake ([`ReadySignal`] / [`ReadyWaiter`])
//! - The message model used by dispatch ([`Message`], [`Venue`], [`Author`])
//!
//! Nothing in this crate performs I/O by itself. Concrete handles live in
//! `ttsbot-backends`; orchestration lives in `ttsbot-runtime`.

pub mod backend;
pub mod chat;
pub mod error;
pub mod factory;
pub mod message;
pub mod ready;

pub use backend::{
    CacheClient, DatabasePool, NotificationSink, SettingsStore, SpeechClient, SpeechStatus,
};
pub use chat::{
    ActivityKind, ChatBackend, ChatSession, CurrentUser, MessageDispatcher, OnlineStatus,
    Presence,
};
pub use error::{BackendError, BackendKind, BackendResult};
pub use factory::{BackendFactory, BackendParams, SpeechSettings};
pub use message::{Author, Message, MessageId, UserId, Venue, VenueId};
pub use ready::{ReadySignal, ReadyWaiter, ready_pair};
